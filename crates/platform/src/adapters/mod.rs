//! Platform-specific adapters.

mod claude;
mod codex;
mod gemini;
mod markdown;
mod mcp_json;
mod opencode;
mod traits;
pub mod utils;

pub use claude::ClaudeAdapter;
pub use codex::CodexAdapter;
pub use gemini::GeminiAdapter;
pub use opencode::OpenCodeAdapter;
#[cfg(test)]
pub use traits::MockPlatformAdapter;
pub use traits::PlatformAdapter;

use aix_backup::{ensure_backed_up, BackupManager};
use aix_state::{AixError, ArtifactKind, Paths, Platform};
use aix_validate::name_problem;
use anyhow::Context;
use std::path::PathBuf;

/// Builds the adapter for `platform`.
pub fn adapter_for(platform: Platform, paths: &Paths) -> Box<dyn PlatformAdapter> {
    match platform {
        Platform::Claude => Box::new(ClaudeAdapter::new(paths)),
        Platform::OpenCode => Box::new(OpenCodeAdapter::new(paths)),
        Platform::Codex => Box::new(CodexAdapter::new(paths)),
        Platform::Gemini => Box::new(GeminiAdapter::new(paths)),
    }
}

/// Location and backup state shared by every adapter.
#[derive(Debug, Clone)]
pub(crate) struct AdapterBase {
    platform: Platform,
    paths: Paths,
    backups: BackupManager,
}

impl AdapterBase {
    pub(crate) fn new(platform: Platform, paths: &Paths) -> Self {
        Self::with_backups(platform, paths, BackupManager::new(paths))
    }

    pub(crate) fn with_backups(platform: Platform, paths: &Paths, backups: BackupManager) -> Self {
        Self {
            platform,
            paths: paths.clone(),
            backups,
        }
    }

    pub(crate) fn platform(&self) -> Platform {
        self.platform
    }

    pub(crate) fn config_dir(&self) -> PathBuf {
        self.paths.global_config_dir(self.platform)
    }

    pub(crate) fn is_available(&self) -> bool {
        self.paths.is_present(self.platform)
    }

    pub(crate) fn dir(&self, kind: ArtifactKind) -> Option<PathBuf> {
        self.paths.artifact_dir(self.platform, kind)
    }

    /// The artifact directory, or `Unsupported` when the platform has none.
    pub(crate) fn require_dir(&self, kind: ArtifactKind) -> Result<PathBuf, AixError> {
        self.dir(kind)
            .ok_or_else(|| AixError::unsupported(self.platform.as_str(), format!("managing {kind}s")))
    }

    pub(crate) fn mcp_path(&self) -> PathBuf {
        self.paths.mcp_config_path(self.platform)
    }

    pub(crate) fn backup_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = [ArtifactKind::Skill, ArtifactKind::Agent, ArtifactKind::Command]
            .into_iter()
            .filter_map(|kind| self.dir(kind))
            .collect();
        paths.push(self.mcp_path());
        paths
    }

    /// Snapshots the platform before its first mutation in this process.
    pub(crate) fn backup(&self) -> crate::Result<()> {
        ensure_backed_up(&self.backups, self.platform, &self.backup_paths())
            .with_context(|| format!("backing up {} before writing", self.platform))?;
        Ok(())
    }

    pub(crate) fn not_found(&self, kind: ArtifactKind, name: &str) -> AixError {
        AixError::not_found(format!("{kind} '{name}'"), self.platform.as_str())
    }
}

/// Rejects names that are not valid artifact names, so they can never form
/// paths outside the artifact directory.
pub(crate) fn check_name(kind: ArtifactKind, name: &str) -> Result<(), AixError> {
    match name_problem(name) {
        Some(problem) => Err(AixError::Validation {
            subject: format!("{kind} '{name}'"),
            issues: vec![problem],
        }),
        None => Ok(()),
    }
}
