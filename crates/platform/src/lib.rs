//! Platform adapters for aix.
//!
//! Each supported assistant (Claude Code, OpenCode, Codex, Gemini) stores
//! skills, agents, commands, and MCP servers in its own layout and format.
//! A [`PlatformAdapter`] translates between that native form and the
//! canonical artifacts from `aix-validate`, backing up the platform's files
//! before the first write of the process.
//!
//! On top of the adapters sit the multi-platform [`Orchestrator`],
//! cross-platform [`translate`], and MCP [`mcp_divergence`] detection.
//!
//! # Examples
//!
//! ```
//! use aix_platform::{adapter_for, McpServer};
//! use aix_state::{Paths, Platform};
//!
//! let home = tempfile::tempdir().unwrap();
//! let paths = Paths::with_home(home.path());
//! let claude = adapter_for(Platform::Claude, &paths);
//!
//! let server = McpServer::stdio("github", "npx", vec!["-y".into(), "gh-mcp".into()]);
//! let report = claude.add_mcp(&server).unwrap();
//! assert!(report.warnings.is_empty());
//!
//! let names: Vec<String> = claude.list_mcp().unwrap().into_iter().map(|m| m.name).collect();
//! assert_eq!(names, vec!["github"]);
//! ```

#![deny(unsafe_code)]

pub mod adapters;
pub mod common;
pub mod divergence;
pub mod orchestrator;
pub mod report;
pub mod translate;

pub use adapters::{
    adapter_for, ClaudeAdapter, CodexAdapter, GeminiAdapter, OpenCodeAdapter, PlatformAdapter,
};
pub use common::{
    AgentInfo, CommandInfo, Located, McpInfo, McpServer, McpTransport, PortableMcp, SkillInfo,
};
pub use divergence::{mcp_divergence, Divergence};
pub use orchestrator::{
    mcp_exists, resolve_platforms, ApplySummary, InstallParams, InstallSummary, Orchestrator,
    PlatformFailure,
};
pub use report::{SkipReason, WriteReport};
pub use translate::translate;

/// Error type for adapter and orchestrator operations.
pub type Error = anyhow::Error;

/// Result type for adapter and orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;
