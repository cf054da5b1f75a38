//! The `manifest.json` stored in every backup directory.

use aix_state::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;

use crate::error::BackupError;

/// Current manifest schema version.
pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";

/// One captured file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path the file was copied from and is restored to.
    pub original_path: PathBuf,
    /// Location of the copy, relative to the backup directory.
    pub rel_path: PathBuf,
    /// Lowercase hex SHA-256 of the copied bytes.
    pub sha256_hash: String,
    /// Permission bits of the source file.
    pub mode: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub platform: Platform,
    pub files: Vec<FileEntry>,
    pub aix_version: String,
    /// Backup identifier; the name of the directory holding this manifest.
    #[serde(skip)]
    pub id: String,
}

impl Manifest {
    /// Reads `<dir>/manifest.json`, taking the id from the directory name.
    pub fn load(dir: &Path) -> Result<Self, BackupError> {
        let path = dir.join(MANIFEST_FILE);
        let text = fs::read_to_string(&path).map_err(|e| BackupError::io("reading", &path, e))?;
        let mut manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| BackupError::Manifest {
                path: path.clone(),
                message: e.to_string(),
            })?;
        if manifest.version > MANIFEST_VERSION {
            return Err(BackupError::Manifest {
                path,
                message: format!("unsupported manifest version {}", manifest.version),
            });
        }
        if let Some(bad) = manifest.files.iter().find(|f| !is_contained(&f.rel_path)) {
            return Err(BackupError::Manifest {
                path,
                message: format!("file entry escapes the backup: {}", bad.rel_path.display()),
            });
        }
        manifest.id = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(manifest)
    }

    /// Total number of captured files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Derives the storage path of `original` inside a backup directory.
///
/// The root and any drive-prefix colons are dropped and `..` is resolved
/// lexically, so distinct absolute paths map to distinct relative ones that
/// never leave the backup directory.
pub fn stored_rel_path(original: &Path) -> PathBuf {
    let mut rel = PathBuf::new();
    for component in original.components() {
        match component {
            Component::Prefix(p) => rel.push(p.as_os_str().to_string_lossy().replace(':', "")),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                rel.pop();
            }
            Component::Normal(s) => rel.push(s.to_string_lossy().replace(':', "")),
        }
    }
    rel
}

fn is_contained(rel: &Path) -> bool {
    !rel.as_os_str().is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)))
}
