//! Atomic file emission shared by the cache and all writers.

use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

/// Write `bytes` to `dest` via a temporary sibling file and a rename, so
/// `dest` either holds the complete content or is left as it was.
///
/// A replaced file keeps its permissions. A new file gets the same mode a
/// plain `std::fs::write` would give it under the current umask.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let existing = std::fs::metadata(dest).ok().map(|meta| meta.permissions());

    let mut builder = tempfile::Builder::new();
    if let (None, Some(perms)) = (&existing, new_file_permissions()) {
        builder.permissions(perms);
    }
    let mut tmp = builder.tempfile_in(dir)?;

    if let Some(perms) = existing {
        tmp.as_file().set_permissions(perms)?;
    }

    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

/// Requested at creation time, so the umask still applies.
#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o666))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}
