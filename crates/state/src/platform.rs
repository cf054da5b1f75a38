use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AixError;

/// A supported AI coding-assistant platform.
///
/// The set is closed: adding a platform means adding an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Claude Code (`~/.claude`).
    Claude,
    /// OpenCode (`~/.config/opencode`).
    #[serde(rename = "opencode")]
    OpenCode,
    /// Codex CLI (`~/.codex`).
    Codex,
    /// Gemini CLI (`~/.gemini`).
    Gemini,
}

impl Platform {
    /// Every platform, in the order commands iterate them by default.
    pub const ALL: [Platform; 4] = [
        Platform::Claude,
        Platform::OpenCode,
        Platform::Codex,
        Platform::Gemini,
    ];

    /// Returns the stable identifier used on the command line and on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Claude => "claude",
            Platform::OpenCode => "opencode",
            Platform::Codex => "codex",
            Platform::Gemini => "gemini",
        }
    }

    /// Returns the human-facing product name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Claude => "Claude Code",
            Platform::OpenCode => "OpenCode",
            Platform::Codex => "Codex CLI",
            Platform::Gemini => "Gemini CLI",
        }
    }

    /// Parses a platform identifier. Matching is exact: identifiers are lowercase.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::parse(s).ok_or_else(|| AixError::NotFound {
            what: format!("platform '{s}'"),
            scope: format!(
                "known platforms ({})",
                Platform::ALL.map(|p| p.as_str()).join(", ")
            ),
        })
    }
}

/// Returns true if `name` is one of the recognized platform identifiers.
pub fn is_valid_platform(name: &str) -> bool {
    Platform::parse(name).is_some()
}

/// The kinds of artifacts aix manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Skill,
    Agent,
    Command,
    Mcp,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Skill => "skill",
            ArtifactKind::Agent => "agent",
            ArtifactKind::Command => "command",
            ArtifactKind::Mcp => "mcp server",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_platform() {
        for p in Platform::ALL {
            assert_eq!(Platform::parse(p.as_str()), Some(p));
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!(is_valid_platform("claude"));
        assert!(!is_valid_platform("Claude"));
        assert!(!is_valid_platform("copilot"));
        assert!(!is_valid_platform(""));
    }

    #[test]
    fn unknown_platform_error_lists_known_ones() {
        let err = "cursor".parse::<Platform>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cursor"));
        assert!(msg.contains("claude, opencode, codex, gemini"));
    }

    #[test]
    fn serde_uses_identifiers() {
        let json = serde_json::to_string(&Platform::OpenCode).unwrap();
        assert_eq!(json, "\"opencode\"");
        let back: Platform = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(back, Platform::Gemini);
    }
}
