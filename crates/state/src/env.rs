use anyhow::Result;
use std::path::{Component, Path, PathBuf};

use crate::error::AixError;

/// Backups kept per platform when nothing overrides it.
pub const DEFAULT_BACKUP_RETENTION: usize = 5;

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the XDG config base: `$XDG_CONFIG_HOME` when set to an absolute
/// path, otherwise `<home>/.config`.
pub fn config_home(home: &Path) -> PathBuf {
    match std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        Some(p) if p.is_absolute() => p,
        _ => home.join(".config"),
    }
}

/// Checks if `AIX_DEBUG` is set to true.
pub fn env_debug() -> bool {
    std::env::var("AIX_DEBUG")
        .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Returns the backup retention count from `AIX_BACKUP_RETENTION`, falling back to 5.
pub fn env_backup_retention() -> usize {
    std::env::var("AIX_BACKUP_RETENTION")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_BACKUP_RETENTION)
}

/// Expands a leading `~` to `home`.
///
/// A `~`-relative path with a `..` segment is rejected so user-supplied paths
/// cannot climb out of the home directory. Names that merely start with two
/// dots (`..hidden`) are fine. Paths without a leading `~` are returned as-is.
pub fn expand_tilde(path: &str, home: &Path) -> Result<PathBuf, AixError> {
    let rest = if path == "~" {
        ""
    } else if let Some(rest) = path.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(path));
    };

    let rel = Path::new(rest);
    if rel.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(AixError::parse(
            path,
            "path escapes the home directory ('..' is not allowed after '~')",
        ));
    }
    Ok(home.join(rel))
}
