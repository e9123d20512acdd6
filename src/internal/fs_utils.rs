//! Filesystem helpers for artifact placement.

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

/// Ensure a file's parent directory exists.
///
/// Creates the parent directory (and all ancestors) if it doesn't exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }
    }
    Ok(())
}

/// Write `bytes` to `dest` so readers see either the old file or the
/// complete new one.
///
/// The data goes to a temporary file in the same directory, is synced, then
/// renamed over `dest`. On failure the temporary file is removed and `dest`
/// is left as it was.
///
/// A replaced file keeps its permissions. A new file gets the mode a plain
/// create would give it (`0666` minus the umask on unix).
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(dest)?;

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let existing = std::fs::metadata(dest)
        .ok()
        .filter(|m| m.is_file())
        .map(|m| m.permissions());

    let mut builder = tempfile::Builder::new();
    builder.prefix(".relfetch-").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    let mut tmp = builder
        .tempfile_in(dir)
        .map_err(|e| Error::filesystem(dir, e))?;

    tmp.write_all(bytes)
        .map_err(|e| Error::filesystem(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::filesystem(tmp.path(), e))?;

    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| Error::filesystem(tmp.path(), e))?;
    }

    tmp.persist(dest)
        .map_err(|e| Error::filesystem(dest, e.error))?;
    Ok(())
}
