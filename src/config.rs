use crate::command_validation::validate_command_name;
use crate::env_util::{
    env_flag, env_path_override, BIN_DIR_ENV, CONFIG_DIR_ENV, FORCE_ENV, RC_FILE_ENV,
};
use crate::shell::ShellKind;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_COMMAND_NAME: &str = "cc-insights";
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Optional overrides read from `launcher.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherFile {
    pub command_name: Option<String>,
    pub bin_dir: Option<PathBuf>,
    pub rc_file: Option<PathBuf>,
    pub allow_unsafe_location: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub home: PathBuf,
    pub bin_dir: PathBuf,
    pub rc_file: PathBuf,
    pub command_name: String,
    pub shell: ShellKind,
    /// Install even when the app sits on a disk image or in a temp dir.
    pub allow_unsafe_location: bool,
}

pub fn config_dir() -> PathBuf {
    env_path_override(CONFIG_DIR_ENV).unwrap_or_else(|| {
        directories::ProjectDirs::from("", "", "cc-insights")
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".cc-insights"))
    })
}

pub fn load_launcher_file(path: &Path) -> Result<LauncherFile> {
    let content = match fs_err::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no launcher config at {}", path.display());
            return Ok(LauncherFile::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read launcher config {}", path.display()))
        }
    };
    let parsed: LauncherFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse TOML {}", path.display()))?;
    if let Some(name) = &parsed.command_name {
        validate_command_name(name)
            .with_context(|| format!("invalid `command_name` in {}", path.display()))?;
    }
    Ok(parsed)
}

impl LauncherConfig {
    pub fn resolve() -> Result<Self> {
        let home = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or_else(|| anyhow!("could not determine the home directory"))?;
        let file = load_launcher_file(&config_dir().join(CONFIG_FILE_NAME))?;
        Ok(Self::from_parts(home, file, ShellKind::detect()))
    }

    /// Environment overrides beat the config file, which beats defaults.
    pub fn from_parts(home: PathBuf, file: LauncherFile, shell: ShellKind) -> Self {
        let bin_dir = env_path_override(BIN_DIR_ENV)
            .or(file.bin_dir)
            .map(|dir| expand_home(&dir, &home))
            .unwrap_or_else(|| default_bin_dir(&home));
        let rc_file = env_path_override(RC_FILE_ENV)
            .or(file.rc_file)
            .map(|rc| expand_home(&rc, &home))
            .unwrap_or_else(|| shell.rc_file(&home));
        let command_name = file
            .command_name
            .unwrap_or_else(|| DEFAULT_COMMAND_NAME.to_string());
        let allow_unsafe_location = env_flag(FORCE_ENV)
            .or(file.allow_unsafe_location)
            .unwrap_or(false);
        Self {
            home,
            bin_dir,
            rc_file,
            command_name,
            shell,
            allow_unsafe_location,
        }
    }

    /// Only `~/.local/bin` is covered by the export line written to rc files.
    pub fn uses_default_bin_dir(&self) -> bool {
        self.bin_dir == default_bin_dir(&self.home)
    }

    pub fn launcher_path(&self) -> PathBuf {
        self.bin_dir.join(&self.command_name)
    }
}

fn default_bin_dir(home: &Path) -> PathBuf {
    home.join(".local").join("bin")
}

// `~/x` and bare relative paths are taken relative to the home directory.
fn expand_home(path: &Path, home: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        return home.join(rest);
    }
    if path.is_relative() {
        return home.join(path);
    }
    path.to_path_buf()
}
