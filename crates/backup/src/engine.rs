//! Backup creation, listing, verification, restore, and retention.
//!
//! Layout: `<root>/<platform>/<id>/manifest.json` plus one copy of every
//! captured file at [`stored_rel_path`] of its original location.

use aix_state::{
    atomic_write, atomic_write_json, expand_tilde, file_mode, set_file_mode, Paths, Platform,
    PRIVATE_FILE_MODE, VERSION,
};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::BackupError;
use crate::manifest::{stored_rel_path, FileEntry, Manifest, MANIFEST_FILE, MANIFEST_VERSION};

const BACKUP_DIR_MODE: u32 = 0o700;

/// A stored file whose bytes no longer match the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMismatch {
    pub original_path: PathBuf,
    pub expected: String,
    /// `None` when the stored copy is missing.
    pub actual: Option<String>,
}

/// Owns one backup root.
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
    home: PathBuf,
}

impl BackupManager {
    pub fn new(paths: &Paths) -> Self {
        Self::with_root(paths.backup_root(), paths.home())
    }

    /// Uses `root` as the backup root and `home` for `~` expansion.
    pub fn with_root(root: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            home: home.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.root.join(platform.as_str())
    }

    fn backup_dir(&self, platform: Platform, id: &str) -> Result<PathBuf, BackupError> {
        let mut parts = Path::new(id).components();
        match (parts.next(), parts.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.platform_dir(platform).join(id)),
            _ => Err(BackupError::NotFound {
                platform,
                id: id.to_string(),
            }),
        }
    }

    /// Snapshots `paths` for `platform`.
    ///
    /// Missing paths are skipped; directories are walked recursively
    /// (symlinks are not followed). Fails with [`BackupError::NoFiles`] if
    /// nothing was captured.
    pub fn create(&self, platform: Platform, paths: &[PathBuf]) -> Result<Manifest, BackupError> {
        let platform_dir = self.platform_dir(platform);
        fs::create_dir_all(&platform_dir)
            .map_err(|e| BackupError::io("creating directory", &platform_dir, e))?;

        let (id, dir) = self.allocate_dir(&platform_dir)?;
        match self.fill(platform, &dir, paths) {
            Ok(mut manifest) => {
                manifest.id = id;
                info!(
                    platform = %platform,
                    id = %manifest.id,
                    files = manifest.files.len(),
                    "Created backup"
                );
                Ok(manifest)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&dir) {
                    warn!(dir = %dir.display(), error = %cleanup, "Failed to remove partial backup");
                }
                Err(e)
            }
        }
    }

    fn allocate_dir(&self, platform_dir: &Path) -> Result<(String, PathBuf), BackupError> {
        loop {
            let id = new_backup_id(OffsetDateTime::now_utc());
            let dir = platform_dir.join(&id);
            match fs::create_dir(&dir) {
                Ok(()) => {
                    set_file_mode(&dir, BACKUP_DIR_MODE)?;
                    return Ok((id, dir));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(BackupError::io("creating directory", &dir, e)),
            }
        }
    }

    fn fill(
        &self,
        platform: Platform,
        dir: &Path,
        paths: &[PathBuf],
    ) -> Result<Manifest, BackupError> {
        let mut files = Vec::new();
        for raw in paths {
            let path = self.absolute(raw)?;
            let meta = match fs::metadata(&path) {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Skipping missing backup path");
                    continue;
                }
                Err(e) => return Err(BackupError::io("reading metadata", &path, e)),
            };

            if meta.is_file() {
                files.push(copy_into(&path, dir)?);
            } else if meta.is_dir() {
                for entry in WalkDir::new(&path).follow_links(false).sort_by_file_name() {
                    let entry = entry.map_err(|e| {
                        let at = e.path().unwrap_or(&path).to_path_buf();
                        BackupError::io("walking", at, io::Error::other(e.to_string()))
                    })?;
                    if entry.file_type().is_file() {
                        files.push(copy_into(entry.path(), dir)?);
                    }
                }
            }
        }

        if files.is_empty() {
            return Err(BackupError::NoFiles);
        }

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            created_at: OffsetDateTime::now_utc(),
            platform,
            files,
            aix_version: VERSION.to_string(),
            id: String::new(),
        };
        atomic_write_json(&dir.join(MANIFEST_FILE), &manifest, PRIVATE_FILE_MODE)?;
        Ok(manifest)
    }

    fn absolute(&self, raw: &Path) -> Result<PathBuf, BackupError> {
        let expanded = match raw.to_str() {
            Some(s) if s.starts_with('~') => expand_tilde(s, &self.home)?,
            _ => raw.to_path_buf(),
        };
        std::path::absolute(&expanded).map_err(|e| BackupError::io("resolving", &expanded, e))
    }

    /// Lists backups for `platform`, newest first.
    ///
    /// Directories without a readable manifest are skipped.
    pub fn list(&self, platform: Platform) -> Result<Vec<Manifest>, BackupError> {
        let dir = self.platform_dir(platform);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BackupError::NoBackupsFound { platform })
            }
            Err(e) => return Err(BackupError::io("reading directory", &dir, e)),
        };

        let mut manifests = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match Manifest::load(&path) {
                Ok(m) => manifests.push(m),
                Err(e) => warn!(dir = %path.display(), error = %e, "Skipping unreadable backup"),
            }
        }

        if manifests.is_empty() {
            return Err(BackupError::NoBackupsFound { platform });
        }
        manifests.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(manifests)
    }

    /// Loads one backup's manifest.
    pub fn get(&self, platform: Platform, id: &str) -> Result<Manifest, BackupError> {
        let dir = self.backup_dir(platform, id)?;
        if !dir.join(MANIFEST_FILE).is_file() {
            return Err(BackupError::NotFound {
                platform,
                id: id.to_string(),
            });
        }
        Manifest::load(&dir)
    }

    /// The most recent backup for `platform`.
    pub fn latest(&self, platform: Platform) -> Result<Manifest, BackupError> {
        self.list(platform)?
            .into_iter()
            .next()
            .ok_or(BackupError::NoBackupsFound { platform })
    }

    /// Rehashes every stored file of a backup without touching the originals.
    pub fn verify(&self, platform: Platform, id: &str) -> Result<Vec<FileMismatch>, BackupError> {
        let manifest = self.get(platform, id)?;
        let dir = self.backup_dir(platform, id)?;
        let mut mismatches = Vec::new();
        for file in &manifest.files {
            let stored = dir.join(&file.rel_path);
            let actual = match hash_file(&stored) {
                Ok(h) => Some(h),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => return Err(BackupError::io("reading", &stored, e)),
            };
            if actual.as_deref() != Some(file.sha256_hash.as_str()) {
                mismatches.push(FileMismatch {
                    original_path: file.original_path.clone(),
                    expected: file.sha256_hash.clone(),
                    actual,
                });
            }
        }
        Ok(mismatches)
    }

    /// Restores every file of a backup to its original path.
    ///
    /// All stored files are verified first; on any mismatch nothing is
    /// written.
    pub fn restore(&self, platform: Platform, id: &str) -> Result<Manifest, BackupError> {
        let manifest = self.get(platform, id)?;
        if let Some(bad) = self.verify(platform, id)?.into_iter().next() {
            return Err(BackupError::Corrupted {
                path: bad.original_path,
                expected: bad.expected,
                actual: bad.actual.unwrap_or_else(|| "missing".to_string()),
            });
        }

        let dir = self.backup_dir(platform, id)?;
        for file in &manifest.files {
            let stored = dir.join(&file.rel_path);
            let data = fs::read(&stored).map_err(|e| BackupError::io("reading", &stored, e))?;
            atomic_write(&file.original_path, &data, file.mode)?;
            debug!(path = %file.original_path.display(), "Restored file");
        }
        info!(platform = %platform, id = %id, files = manifest.files.len(), "Restored backup");
        Ok(manifest)
    }

    /// Keeps the `keep` newest backups and deletes the rest.
    ///
    /// Returns the number deleted. `keep = 0` deletes everything.
    pub fn prune(&self, platform: Platform, keep: usize) -> Result<usize, BackupError> {
        let manifests = match self.list(platform) {
            Ok(m) => m,
            Err(BackupError::NoBackupsFound { .. }) => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for manifest in manifests.iter().skip(keep) {
            let dir = self.backup_dir(platform, &manifest.id)?;
            fs::remove_dir_all(&dir).map_err(|e| BackupError::io("removing", &dir, e))?;
            removed += 1;
        }
        if removed > 0 {
            info!(platform = %platform, removed, keep, "Pruned backups");
        }
        Ok(removed)
    }

    /// Deletes one backup.
    pub fn delete(&self, platform: Platform, id: &str) -> Result<(), BackupError> {
        self.get(platform, id)?;
        let dir = self.backup_dir(platform, id)?;
        fs::remove_dir_all(&dir).map_err(|e| BackupError::io("removing", &dir, e))?;
        info!(platform = %platform, id = %id, "Deleted backup");
        Ok(())
    }
}

/// Formats `YYYYMMDDThhmmss-<6 hex>` for `now`.
pub fn new_backup_id(now: OffsetDateTime) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}-{}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        &suffix[..6]
    )
}

// Copies `src` under `dir`, hashing while streaming.
fn copy_into(src: &Path, dir: &Path) -> Result<FileEntry, BackupError> {
    let rel_path = stored_rel_path(src);
    let dest = dir.join(&rel_path);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| BackupError::io("creating directory", parent, e))?;
    }

    let mut input = fs::File::open(src).map_err(|e| BackupError::io("opening", src, e))?;
    let mode = file_mode(
        &input
            .metadata()
            .map_err(|e| BackupError::io("reading metadata", src, e))?,
    );
    let mut output = fs::File::create(&dest).map_err(|e| BackupError::io("creating", &dest, e))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = input
            .read(&mut buf)
            .map_err(|e| BackupError::io("reading", src, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        output
            .write_all(&buf[..n])
            .map_err(|e| BackupError::io("writing", &dest, e))?;
    }
    output
        .sync_all()
        .map_err(|e| BackupError::io("syncing", &dest, e))?;
    drop(output);
    set_file_mode(&dest, mode)?;

    Ok(FileEntry {
        original_path: src.to_path_buf(),
        rel_path,
        sha256_hash: format!("{:x}", hasher.finalize()),
        mode,
    })
}

fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
