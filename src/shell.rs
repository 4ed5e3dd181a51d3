use crate::path_util::basename;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    Zsh,
    Bash,
    Other,
}

impl ShellKind {
    /// Classify a login shell path such as the value of `$SHELL`.
    pub fn from_shell_path(shell: &str) -> Self {
        match basename(shell.trim()) {
            Some("zsh") => Self::Zsh,
            Some("bash") => Self::Bash,
            _ => Self::Other,
        }
    }

    pub fn detect() -> Self {
        let shell = std::env::var("SHELL").unwrap_or_default();
        let kind = Self::from_shell_path(&shell);
        log::debug!("login shell `{shell}` detected as {kind:?}");
        kind
    }

    /// Startup file an interactive shell of this kind sources.
    pub fn rc_file(self, home: &Path) -> PathBuf {
        match self {
            Self::Zsh => home.join(".zshrc"),
            Self::Bash => home.join(".bashrc"),
            Self::Other => home.join(".profile"),
        }
    }
}

/// Whether `dir` is one of the entries of a `PATH`-style value. Entries must
/// match exactly; a sibling such as `bin-tools` does not count for `bin`.
pub fn dir_on_path(dir: &Path, path_var: Option<&OsStr>) -> bool {
    let Some(path_var) = path_var else {
        return false;
    };
    std::env::split_paths(path_var).any(|entry| entry == dir)
}
