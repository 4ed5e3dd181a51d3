use crate::command_validation::validate_command_name;
use crate::fs_util::write_atomically;
use anyhow::{anyhow, Context, Result};
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const SHEBANG: &str = "#!/bin/bash";
const LAUNCHER_MODE: u32 = 0o755;

/// Shell wrapper that replaces itself with the app executable, forwarding
/// every argument. The path is written inside double quotes exactly as given.
pub fn generate_script(executable_path: &str) -> String {
    format!("{SHEBANG}\nexec \"{executable_path}\" \"$@\"\n")
}

fn looks_like_generated_launcher(content: &str) -> bool {
    let mut lines = content.lines();
    lines.next() == Some(SHEBANG)
        && lines
            .next()
            .is_some_and(|line| line.starts_with("exec \"") && line.ends_with(" \"$@\""))
}

/// Write the launcher for `executable_path` as `bin_dir/command_name`.
pub fn install_launcher(bin_dir: &Path, command_name: &str, executable_path: &str) -> Result<PathBuf> {
    validate_command_name(command_name)
        .with_context(|| format!("invalid launcher name `{command_name}`"))?;
    fs_err::create_dir_all(bin_dir)
        .with_context(|| format!("failed to create {}", bin_dir.display()))?;

    let target = bin_dir.join(command_name);
    if target.is_dir() {
        return Err(anyhow!("{} is a directory", target.display()));
    }
    let script = generate_script(executable_path);
    write_atomically(
        &target,
        script.as_bytes(),
        Some(Permissions::from_mode(LAUNCHER_MODE)),
    )
    .with_context(|| format!("failed to write launcher {}", target.display()))?;

    log::info!("wrote launcher {} -> {executable_path}", target.display());
    Ok(target)
}

/// Delete a launcher written by [`install_launcher`]. Files that do not look
/// like one are left alone and reported as an error.
pub fn remove_launcher(bin_dir: &Path, command_name: &str) -> Result<bool> {
    validate_command_name(command_name)
        .with_context(|| format!("invalid launcher name `{command_name}`"))?;
    let target = bin_dir.join(command_name);

    let metadata = match fs_err::symlink_metadata(&target) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no launcher at {}", target.display());
            return Ok(false);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to inspect {}", target.display()))
        }
    };
    if !metadata.is_file() {
        return Err(anyhow!(
            "refusing to remove {}; it is not a regular file",
            target.display()
        ));
    }

    let content = fs_err::read_to_string(&target)
        .with_context(|| format!("failed to read {}", target.display()))?;
    if !looks_like_generated_launcher(&content) {
        return Err(anyhow!(
            "refusing to remove {}; it was not created by this installer",
            target.display()
        ));
    }

    fs_err::remove_file(&target)
        .with_context(|| format!("failed to remove launcher {}", target.display()))?;
    log::info!("removed launcher {}", target.display());
    Ok(true)
}
