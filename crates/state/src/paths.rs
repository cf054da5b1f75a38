//! Per-platform path resolution.
//!
//! Every location aix reads or writes is derived from two inputs: the home
//! directory and the XDG config base. [`Paths`] captures both once so the rest
//! of the code is a pure function of them (and tests can point everything at a
//! temp directory).

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::env::{config_home, expand_tilde, home_dir};
use crate::error::AixError;
use crate::platform::{ArtifactKind, Platform};
use crate::APP_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    home: PathBuf,
    config_home: PathBuf,
}

impl Paths {
    /// Resolves paths from the current environment.
    pub fn from_env() -> Result<Self> {
        let home = home_dir()?;
        let config_home = config_home(&home);
        tracing::debug!(
            target: "aix::paths",
            home = %home.display(),
            config_home = %config_home.display(),
            "Resolved base directories"
        );
        Ok(Self { home, config_home })
    }

    /// Builds paths rooted at `home`, with the config base at `<home>/.config`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let config_home = home.join(".config");
        Self { home, config_home }
    }

    /// Builds paths from explicit home and config base directories.
    pub fn new(home: impl Into<PathBuf>, config_home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            config_home: config_home.into(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_home(&self) -> &Path {
        &self.config_home
    }

    /// Expands `~` against this home directory.
    pub fn expand(&self, path: &str) -> Result<PathBuf, AixError> {
        expand_tilde(path, &self.home)
    }

    /// Directory holding aix's own files.
    pub fn tool_dir(&self) -> PathBuf {
        self.config_home.join(APP_NAME)
    }

    /// Path to `config.yaml`.
    pub fn tool_config_path(&self) -> PathBuf {
        self.tool_dir().join("config.yaml")
    }

    /// Root of the backup store.
    pub fn backup_root(&self) -> PathBuf {
        self.tool_dir().join("backups")
    }

    /// The platform's global configuration directory.
    pub fn global_config_dir(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Claude => self.home.join(".claude"),
            Platform::OpenCode => self.config_home.join("opencode"),
            Platform::Codex => self.home.join(".codex"),
            Platform::Gemini => self.home.join(".gemini"),
        }
    }

    /// Directory holding artifacts of `kind`, or `None` when the platform does
    /// not store that kind as files.
    pub fn artifact_dir(&self, platform: Platform, kind: ArtifactKind) -> Option<PathBuf> {
        let root = self.global_config_dir(platform);
        let sub = match (platform, kind) {
            (_, ArtifactKind::Mcp) => return None,
            (Platform::Claude, ArtifactKind::Skill) => "skills",
            (Platform::Claude, ArtifactKind::Agent) => "agents",
            (Platform::Claude, ArtifactKind::Command) => "commands",
            (Platform::OpenCode, ArtifactKind::Skill) => "skill",
            (Platform::OpenCode, ArtifactKind::Agent) => "agent",
            (Platform::OpenCode, ArtifactKind::Command) => "command",
            (Platform::Codex, ArtifactKind::Skill) => "skills",
            (Platform::Codex, ArtifactKind::Command) => "prompts",
            (Platform::Codex, ArtifactKind::Agent) => return None,
            (Platform::Gemini, ArtifactKind::Skill) => "skills",
            (Platform::Gemini, ArtifactKind::Command) => "commands",
            (Platform::Gemini, ArtifactKind::Agent) => return None,
        };
        Some(root.join(sub))
    }

    /// The file holding the platform's MCP server definitions.
    ///
    /// Claude keeps user-scoped servers in `~/.claude.json`, directly in the
    /// home directory rather than under `~/.claude/`.
    pub fn mcp_config_path(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Claude => self.home.join(".claude.json"),
            Platform::OpenCode => self.global_config_dir(platform).join("opencode.json"),
            Platform::Codex => self.global_config_dir(platform).join("config.toml"),
            Platform::Gemini => self.global_config_dir(platform).join("settings.json"),
        }
    }

    /// A platform is present when its config directory exists.
    pub fn is_present(&self, platform: Platform) -> bool {
        self.global_config_dir(platform).is_dir()
    }

    /// Platforms whose config directory exists, in canonical order.
    pub fn present_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.is_present(*p))
            .collect()
    }
}
