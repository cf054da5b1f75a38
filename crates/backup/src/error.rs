use aix_state::{AixError, ErrorKind, Platform};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("no backups found for {platform}")]
    NoBackupsFound { platform: Platform },

    #[error("backup '{id}' not found in {platform} backups")]
    NotFound { platform: Platform, id: String },

    #[error("no files to back up")]
    NoFiles,

    #[error("backup corrupted: {}: expected sha256 {expected}, got {actual}", path.display())]
    Corrupted {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    #[error(transparent)]
    State(#[from] AixError),
}

impl BackupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackupError::NoBackupsFound { .. } | BackupError::NotFound { .. } => ErrorKind::NotFound,
            BackupError::NoFiles => ErrorKind::NotFound,
            BackupError::Corrupted { .. } => ErrorKind::Integrity,
            BackupError::Manifest { .. } => ErrorKind::Parse,
            BackupError::State(e) => e.kind(),
        }
    }

    pub(crate) fn io(op: &'static str, path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        BackupError::State(AixError::io(op, path, source))
    }
}

/// Classifies an error chain, recognising backup failures before falling
/// back to [`aix_state::classify`].
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BackupError>().map(BackupError::kind))
        .unwrap_or_else(|| aix_state::classify(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(BackupError::NoFiles.to_string(), "no files to back up");
        let corrupted = BackupError::Corrupted {
            path: "/b/x".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(corrupted.kind(), ErrorKind::Integrity);

        let chained = anyhow::Error::from(corrupted).context("restoring");
        assert_eq!(classify(&chained), ErrorKind::Integrity);

        let state = anyhow::Error::from(AixError::conflict("skill 'a'", "claude"));
        assert_eq!(classify(&state), ErrorKind::Conflict);
    }
}
