//! All-or-nothing file replacement
//!
//! Content is written to a temporary file in the destination directory and
//! renamed over the destination, so a failed write never leaves a truncated
//! file behind.

use crate::error::StepError;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Mode given to files that did not exist before
pub const DEFAULT_FILE_MODE: u32 = 0o644;

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn staged(path: &Path, contents: &[u8]) -> Result<NamedTempFile, StepError> {
    let mut tmp =
        NamedTempFile::new_in(parent_dir(path)).map_err(|e| StepError::write(path, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| StepError::write(path, e))?;
    Ok(tmp)
}

/// Replace `path` with `contents`.
///
/// An existing file keeps its permission bits; a new file gets [`DEFAULT_FILE_MODE`].
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), StepError> {
    let tmp = staged(path, contents)?;

    let permissions = match fs::metadata(path) {
        Ok(meta) => meta.permissions(),
        Err(_) => default_permissions(tmp.as_file())?,
    };
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| StepError::write(path, e))?;

    tmp.persist(path)
        .map_err(|e| StepError::write(path, e.error))?;
    Ok(())
}

/// Create `path` with `contents` unless something already exists there.
///
/// Returns `false` when another writer got there first.
pub fn create_file(path: &Path, contents: &[u8]) -> Result<bool, StepError> {
    let tmp = staged(path, contents)?;
    let permissions = default_permissions(tmp.as_file())?;
    tmp.as_file()
        .set_permissions(permissions)
        .map_err(|e| StepError::write(path, e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StepError::write(path, e.error)),
    }
}

#[cfg(unix)]
fn default_permissions(_file: &fs::File) -> Result<fs::Permissions, StepError> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(DEFAULT_FILE_MODE))
}

#[cfg(not(unix))]
fn default_permissions(file: &fs::File) -> Result<fs::Permissions, StepError> {
    let mut permissions = file
        .metadata()
        .map_err(|e| StepError::write("<tempfile>", e))?
        .permissions();
    permissions.set_readonly(false);
    Ok(permissions)
}
