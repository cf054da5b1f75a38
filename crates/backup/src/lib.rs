//! Configuration backups for aix.
//!
//! Backups are directories of copied files plus a `manifest.json` recording
//! each file's original path, SHA-256, and permission bits. Restores verify
//! every hash before writing anything back.

#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod hook;
pub mod manifest;

pub use engine::{new_backup_id, BackupManager, FileMismatch};
pub use error::{classify, BackupError};
pub use hook::{ensure_backed_up, reset, reset_all};
pub use manifest::{stored_rel_path, FileEntry, Manifest, MANIFEST_FILE, MANIFEST_VERSION};
