//! Crash-safe file replacement.
//!
//! Data goes to a sibling temp file (`.aix-atomic-<random>.tmp`) which is
//! synced, chmod'ed, and renamed over the target. The temp file is a
//! [`tempfile::NamedTempFile`], so every early return removes it on drop and
//! the target is only ever replaced by a complete payload.

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::AixError;

/// Mode for config files aix creates.
pub const DEFAULT_FILE_MODE: u32 = 0o644;
/// Mode for files that may hold secrets (backup manifests).
pub const PRIVATE_FILE_MODE: u32 = 0o600;

const TEMP_PREFIX: &str = ".aix-atomic-";
const TEMP_SUFFIX: &str = ".tmp";

/// Atomically replaces `path` with `data`, leaving the file with `mode`.
///
/// Missing parent directories are created. On error the previous contents of
/// `path` (if any) are untouched and no temp file remains.
pub fn atomic_write(path: &Path, data: &[u8], mode: u32) -> Result<(), AixError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| AixError::io("creating directory", dir, e))?;

    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| AixError::io("creating temp file", dir, e))?;

    tmp.as_file_mut()
        .write_all(data)
        .map_err(|e| AixError::io("writing temp file", tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| AixError::io("syncing temp file", tmp.path(), e))?;
    set_file_mode(tmp.path(), mode)?;

    tmp.persist(path)
        .map_err(|e| AixError::io("renaming temp file", path, e.error))?;

    sync_dir(dir);
    tracing::debug!(
        target: "aix::atomic",
        path = %path.display(),
        bytes = data.len(),
        "Wrote file atomically"
    );
    Ok(())
}

/// Writes `value` as indented JSON with a trailing newline.
pub fn atomic_write_json<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    mode: u32,
) -> Result<(), AixError> {
    let mut data = serde_json::to_vec_pretty(value).map_err(|e| AixError::Marshal {
        format: "json",
        message: e.to_string(),
    })?;
    data.push(b'\n');
    atomic_write(path, &data, mode)
}

/// Writes `value` as YAML.
pub fn atomic_write_yaml<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    mode: u32,
) -> Result<(), AixError> {
    let data = serde_yaml::to_string(value).map_err(|e| AixError::Marshal {
        format: "yaml",
        message: e.to_string(),
    })?;
    atomic_write(path, data.as_bytes(), mode)
}

/// Writes `value` as TOML.
pub fn atomic_write_toml<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
    mode: u32,
) -> Result<(), AixError> {
    let data = toml::to_string_pretty(value).map_err(|e| AixError::Marshal {
        format: "toml",
        message: e.to_string(),
    })?;
    atomic_write(path, data.as_bytes(), mode)
}

/// Returns the permission bits of a file.
#[cfg(unix)]
pub fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
pub fn file_mode(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        DEFAULT_FILE_MODE
    }
}

/// Sets the permission bits of `path`.
#[cfg(unix)]
pub fn set_file_mode(path: &Path, mode: u32) -> Result<(), AixError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| AixError::io("setting permissions", path, e))
}

#[cfg(not(unix))]
pub fn set_file_mode(_path: &Path, _mode: u32) -> Result<(), AixError> {
    Ok(())
}

/// Returns the mode of an existing file, or `default` if it does not exist.
pub fn existing_mode_or(path: &Path, default: u32) -> u32 {
    fs::metadata(path)
        .map(|m| file_mode(&m))
        .unwrap_or(default)
}

// Best effort: some filesystems refuse to open or sync directories.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    if let Ok(handle) = fs::File::open(dir) {
        if let Err(e) = handle.sync_all() {
            tracing::debug!(target: "aix::atomic", dir = %dir.display(), error = %e, "Directory fsync failed");
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}
