use crate::fs_util::write_atomically;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MARKER_COMMENT: &str = "# Added by CC Insights";
pub const LOCAL_BIN_FRAGMENT: &str = ".local/bin";
pub const PATH_EXPORT_LINE: &str = "export PATH=\"$HOME/.local/bin:$PATH\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathUpdate {
    AlreadyPresent,
    Appended,
}

#[derive(Debug, Error)]
pub enum PathUpdateError {
    #[error("permission denied while updating {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("rc file update did not complete: {0}")]
    Blocking(String),
}

impl PathUpdateError {
    fn from_io(action: &'static str, path: &Path, source: io::Error) -> Self {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, source }
        } else {
            Self::Io {
                action,
                path,
                source,
            }
        }
    }

    pub fn kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::PermissionDenied { .. } => Some(io::ErrorKind::PermissionDenied),
            Self::Io { source, .. } => Some(source.kind()),
            Self::Blocking(_) => None,
        }
    }
}

/// Make sure `rc_file` puts `~/.local/bin` on `PATH`. Runs on the blocking
/// pool so callers inside a runtime are not stalled by file I/O.
pub async fn add_to_path(rc_file: impl Into<PathBuf>) -> Result<PathUpdate, PathUpdateError> {
    let rc_file = rc_file.into();
    tokio::task::spawn_blocking(move || add_to_path_blocking(&rc_file))
        .await
        .map_err(|err| PathUpdateError::Blocking(err.to_string()))?
}

pub fn add_to_path_blocking(rc_file: &Path) -> Result<PathUpdate, PathUpdateError> {
    let target = resolve_symlink(rc_file)?;
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)
            .map_err(|err| PathUpdateError::from_io("create directory for", &target, err))?;
    }

    let existing = match fs_err::read_to_string(&target) {
        Ok(content) => Some(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(PathUpdateError::from_io("read", &target, err)),
    };
    let content = existing.as_deref().unwrap_or_default();
    if content.contains(LOCAL_BIN_FRAGMENT) {
        log::debug!("{} already references {LOCAL_BIN_FRAGMENT}", target.display());
        return Ok(PathUpdate::AlreadyPresent);
    }

    let updated = append_export(content);
    let permissions = match existing {
        Some(_) => Some(
            fs_err::metadata(&target)
                .map_err(|err| PathUpdateError::from_io("inspect", &target, err))?
                .permissions(),
        ),
        None => None,
    };
    write_atomically(&target, updated.as_bytes(), permissions)
        .map_err(|err| PathUpdateError::from_io("write", &target, err))?;

    log::info!("added {LOCAL_BIN_FRAGMENT} to PATH in {}", target.display());
    Ok(PathUpdate::Appended)
}

/// Undo [`add_to_path`]: drop the marker, the export line that follows it,
/// and the blank separator line written before the marker.
pub fn remove_from_path(rc_file: &Path) -> Result<bool, PathUpdateError> {
    let target = resolve_symlink(rc_file)?;
    let content = match fs_err::read_to_string(&target) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(PathUpdateError::from_io("read", &target, err)),
    };

    let Some(stripped) = strip_export(&content) else {
        log::debug!("no launcher PATH block in {}", target.display());
        return Ok(false);
    };
    let permissions = fs_err::metadata(&target)
        .map_err(|err| PathUpdateError::from_io("inspect", &target, err))?
        .permissions();
    write_atomically(&target, stripped.as_bytes(), Some(permissions))
        .map_err(|err| PathUpdateError::from_io("write", &target, err))?;

    log::info!("removed launcher PATH block from {}", target.display());
    Ok(true)
}

fn append_export(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + MARKER_COMMENT.len() + PATH_EXPORT_LINE.len() + 4);
    out.push_str(content);
    if !content.is_empty() {
        if !content.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(MARKER_COMMENT);
    out.push('\n');
    out.push_str(PATH_EXPORT_LINE);
    out.push('\n');
    out
}

fn strip_export(content: &str) -> Option<String> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let marker_idx = (0..lines.len()).find(|&idx| {
        lines[idx].trim_end() == MARKER_COMMENT
            && lines
                .get(idx + 1)
                .is_some_and(|next| next.trim_end() == PATH_EXPORT_LINE)
    })?;

    let start = if marker_idx > 0 && lines[marker_idx - 1].trim().is_empty() {
        marker_idx - 1
    } else {
        marker_idx
    };
    let mut out = String::with_capacity(content.len());
    for line in &lines[..start] {
        out.push_str(line);
    }
    for line in &lines[marker_idx + 2..] {
        out.push_str(line);
    }
    Some(out)
}

const MAX_LINK_HOPS: usize = 40;

// Renaming over a symlinked rc file would replace the link, so edit its
// target instead. Links are followed one hop at a time so a dangling link
// still yields the path its target should be created at.
fn resolve_symlink(rc_file: &Path) -> Result<PathBuf, PathUpdateError> {
    let mut current = rc_file.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        match fs_err::symlink_metadata(&current) {
            Ok(metadata) if metadata.file_type().is_symlink() => {
                let dest = fs_err::read_link(&current)
                    .map_err(|err| PathUpdateError::from_io("resolve", &current, err))?;
                current = match current.parent() {
                    Some(parent) => parent.join(dest),
                    None => dest,
                };
            }
            Ok(_) => return Ok(current),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(current),
            Err(err) => return Err(PathUpdateError::from_io("inspect", &current, err)),
        }
    }
    Err(PathUpdateError::from_io(
        "resolve",
        rc_file,
        io::Error::new(io::ErrorKind::Other, "too many levels of symbolic links"),
    ))
}

#[cfg(test)]
mod tests {
    use super::{
        add_to_path, add_to_path_blocking, append_export, remove_from_path, strip_export,
        PathUpdate, PathUpdateError, LOCAL_BIN_FRAGMENT, MARKER_COMMENT, PATH_EXPORT_LINE,
    };
    use std::fs;
    use std::io;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn append_to_empty_content_has_no_leading_blank_line() {
        assert_eq!(
            append_export(""),
            format!("{MARKER_COMMENT}\n{PATH_EXPORT_LINE}\n")
        );
    }

    #[test]
    fn append_terminates_unfinished_last_line() {
        let out = append_export("alias ll='ls -l'");
        assert!(out.starts_with("alias ll='ls -l'\n\n# Added by CC Insights\n"), "{out}");
    }

    #[test]
    fn strip_reverses_append() {
        for original in ["", "export EDITOR=vim\n", "alias g=git\n\n", "no-newline"] {
            let appended = append_export(original);
            let stripped = strip_export(&appended).expect("block present");
            let expected = if original.ends_with('\n') || original.is_empty() {
                original.to_string()
            } else {
                format!("{original}\n")
            };
            assert_eq!(stripped, expected, "{original:?}");
        }
    }

    #[test]
    fn strip_ignores_marker_without_export_line() {
        assert_eq!(strip_export("# Added by CC Insights\necho hi\n"), None);
    }

    #[tokio::test]
    async fn creates_missing_file_and_parents() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join("nested").join("dir").join(".zshrc");

        let outcome = add_to_path(&rc).await.expect("add");

        assert_eq!(outcome, PathUpdate::Appended);
        let content = fs::read_to_string(&rc).expect("read");
        assert!(content.contains(MARKER_COMMENT), "{content}");
        assert!(content.contains("CC Insights"), "{content}");
        assert_eq!(content.matches(LOCAL_BIN_FRAGMENT).count(), 1, "{content}");
    }

    #[tokio::test]
    async fn second_call_is_a_no_op() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join(".zshrc");
        fs::write(&rc, "export EDITOR=vim\n").expect("seed");

        assert_eq!(add_to_path(&rc).await.expect("first"), PathUpdate::Appended);
        let after_first = fs::read_to_string(&rc).expect("read");
        assert_eq!(add_to_path(&rc).await.expect("second"), PathUpdate::AlreadyPresent);
        let after_second = fs::read_to_string(&rc).expect("read");

        assert_eq!(after_first, after_second);
        assert_eq!(after_second.matches(LOCAL_BIN_FRAGMENT).count(), 1);
    }

    #[test]
    fn existing_reference_is_left_untouched() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join(".bashrc");
        let original = "PATH=\"$HOME/.local/bin:$PATH\"\n";
        fs::write(&rc, original).expect("seed");

        assert_eq!(add_to_path_blocking(&rc).expect("add"), PathUpdate::AlreadyPresent);
        assert_eq!(fs::read_to_string(&rc).expect("read"), original);
    }

    #[test]
    fn existing_content_is_preserved_verbatim() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join(".zshrc");
        let original = "# my settings\nexport EDITOR=vim\nalias ll='ls -la'\n";
        fs::write(&rc, original).expect("seed");

        add_to_path_blocking(&rc).expect("add");

        let content = fs::read_to_string(&rc).expect("read");
        assert!(content.starts_with(original), "{content}");
        assert!(content.ends_with(&format!("{MARKER_COMMENT}\n{PATH_EXPORT_LINE}\n")), "{content}");
    }

    #[test]
    fn keeps_file_permissions() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join(".zshrc");
        fs::write(&rc, "set -o vi\n").expect("seed");
        fs::set_permissions(&rc, fs::Permissions::from_mode(0o600)).expect("chmod");

        add_to_path_blocking(&rc).expect("add");

        let mode = fs::metadata(&rc).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn symlinked_rc_file_keeps_its_link() {
        let temp = TempDir::new().expect("tempdir");
        let real = temp.path().join("dotfiles").join("zshrc");
        fs::create_dir_all(real.parent().expect("parent")).expect("mkdir");
        fs::write(&real, "export LANG=C\n").expect("seed");
        let link = temp.path().join(".zshrc");
        symlink(&real, &link).expect("symlink");

        add_to_path_blocking(&link).expect("add");

        assert!(fs::symlink_metadata(&link).expect("lstat").file_type().is_symlink());
        assert!(fs::read_to_string(&real).expect("read").contains(PATH_EXPORT_LINE));
    }

    #[test]
    fn dangling_symlink_target_is_created() {
        let temp = TempDir::new().expect("tempdir");
        let link = temp.path().join(".zshrc");
        symlink("dotfiles/zshrc", &link).expect("symlink");

        assert_eq!(add_to_path_blocking(&link).expect("add"), PathUpdate::Appended);

        assert!(fs::symlink_metadata(&link).expect("lstat").file_type().is_symlink());
        let real = temp.path().join("dotfiles").join("zshrc");
        assert_eq!(
            fs::read_to_string(&real).expect("read target"),
            format!("{MARKER_COMMENT}\n{PATH_EXPORT_LINE}\n")
        );
        assert_eq!(add_to_path_blocking(&link).expect("again"), PathUpdate::AlreadyPresent);
    }

    #[test]
    fn chained_symlinks_are_followed_to_the_final_file() {
        let temp = TempDir::new().expect("tempdir");
        let real = temp.path().join("zshrc.real");
        fs::write(&real, "setopt autocd\n").expect("seed");
        let middle = temp.path().join("zshrc.middle");
        symlink(&real, &middle).expect("symlink middle");
        let link = temp.path().join(".zshrc");
        symlink("zshrc.middle", &link).expect("symlink link");

        add_to_path_blocking(&link).expect("add");

        assert!(fs::symlink_metadata(&middle).expect("lstat").file_type().is_symlink());
        assert!(fs::read_to_string(&real).expect("read").contains(PATH_EXPORT_LINE));
    }

    #[test]
    fn permission_denied_maps_to_its_own_variant() {
        let path = Path::new("/etc/zshrc");
        let err = PathUpdateError::from_io(
            "write",
            path,
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, PathUpdateError::PermissionDenied { .. }), "{err:?}");
        assert_eq!(err.kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(err.to_string().contains("permission denied"), "{err}");
        assert!(err.to_string().contains("/etc/zshrc"), "{err}");

        let err = PathUpdateError::from_io("read", path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, PathUpdateError::Io { action: "read", .. }), "{err:?}");
        assert_eq!(err.kind(), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn unwritable_location_returns_error_value() {
        let temp = TempDir::new().expect("tempdir");
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "").expect("seed");
        let rc = blocker.join(".zshrc");

        let err = add_to_path_blocking(&rc).expect_err("should fail");
        assert!(matches!(err, PathUpdateError::Io { .. }), "{err:?}");
        assert!(err.kind().is_some());
        assert!(err.to_string().contains("not-a-dir"), "{err}");
    }

    #[test]
    fn remove_restores_original_content() {
        let temp = TempDir::new().expect("tempdir");
        let rc = temp.path().join(".zshrc");
        let original = "export EDITOR=vim\n";
        fs::write(&rc, original).expect("seed");

        add_to_path_blocking(&rc).expect("add");
        assert!(remove_from_path(&rc).expect("remove"));
        assert_eq!(fs::read_to_string(&rc).expect("read"), original);
        assert!(!remove_from_path(&rc).expect("second remove"));
    }

    #[test]
    fn remove_on_missing_file_reports_nothing_changed() {
        let temp = TempDir::new().expect("tempdir");
        assert!(!remove_from_path(&temp.path().join(".zshrc")).expect("remove"));
    }
}
