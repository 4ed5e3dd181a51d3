use std::fs::Permissions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const MAX_TMP_NAME_ATTEMPTS: usize = 32;

/// Replace `path` with `bytes` via a sibling temp file and a rename, so an
/// interrupted write never leaves a truncated target behind.
pub fn write_atomically(path: &Path, bytes: &[u8], permissions: Option<Permissions>) -> io::Result<()> {
    for attempt in 0..MAX_TMP_NAME_ATTEMPTS {
        let tmp_path = temp_sibling_path(path, attempt);
        let mut tmp_file = match fs_err::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        };

        let staged = tmp_file
            .write_all(bytes)
            .and_then(|()| tmp_file.sync_all())
            .and_then(|()| match &permissions {
                Some(perms) => fs_err::set_permissions(&tmp_path, perms.clone()),
                None => Ok(()),
            })
            .and_then(|()| fs_err::rename(&tmp_path, path));
        if let Err(err) = staged {
            delete_best_effort(&tmp_path);
            return Err(err);
        }
        return Ok(());
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!(
            "failed to create a temporary file next to {}; too many filename collisions",
            path.display()
        ),
    ))
}

fn temp_sibling_path(path: &Path, attempt: usize) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_name = format!(".{name}.tmp-{}-{attempt}", std::process::id());
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

fn delete_best_effort(path: &Path) {
    let _ = fs_err::remove_file(path);
}
