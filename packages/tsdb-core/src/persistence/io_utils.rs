//! I/O utilities for persistence operations.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::DbError;

/// Wraps an I/O error with the operation that produced it.
pub fn classify_io_error(error: std::io::Error, context: &str) -> DbError {
    let context = match error.kind() {
        ErrorKind::StorageFull => format!("{} (disk full)", context),
        ErrorKind::PermissionDenied => format!("{} (permission denied)", context),
        _ => context.to_string(),
    };
    DbError::Io {
        context,
        source: error,
    }
}

/// Creates a temporary file next to `path` so that it can later be renamed
/// over it.
///
/// On unix the file is opened with mode 0o666, which the process umask
/// narrows the same way it would for a plainly created file.
pub fn sibling_tempfile(path: &Path, prefix: &str) -> Result<NamedTempFile, DbError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix).suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
        .tempfile_in(dir)
        .map_err(|e| classify_io_error(e, "Failed to create temp file"))
}

/// Replaces `path` with a fully written temporary file, keeping the
/// permissions of `path` if it exists.
pub fn commit(tmp: NamedTempFile, path: &Path) -> Result<(), DbError> {
    commit_as(tmp, path, path)
}

/// Replaces `path` with a fully written temporary file that takes the
/// permissions of `template`, when `template` exists.
pub fn commit_as(tmp: NamedTempFile, path: &Path, template: &Path) -> Result<(), DbError> {
    if let Ok(metadata) = fs::metadata(template) {
        fs::set_permissions(tmp.path(), metadata.permissions())
            .map_err(|e| classify_io_error(e, "Failed to set temp file permissions"))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;
    tmp.persist(path)
        .map_err(|e| classify_io_error(e.error, "Failed to rename temp file"))?;
    Ok(())
}

/// Writes `contents` to `path` through a temporary file and a rename, so
/// readers see either the old or the new contents.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DbError> {
    let prefix = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tmp = sibling_tempfile(path, &prefix)?;
    tmp.write_all(contents)
        .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
    commit(tmp, path)
}
