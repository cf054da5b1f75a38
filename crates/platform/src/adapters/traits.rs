//! Trait definition for platform adapters.

use aix_state::Platform;
use aix_validate::{Agent, Command, Skill};
use std::path::PathBuf;

use crate::common::{AgentInfo, CommandInfo, McpInfo, McpServer, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

#[cfg(test)]
use mockall::automock;

/// Reads and writes one platform's native configuration.
///
/// The adapter is the only place where canonical artifacts are mapped to a
/// platform's file layout and field names. Every mutating method backs the
/// platform up (once per process) before the first write.
#[cfg_attr(test, automock)]
pub trait PlatformAdapter: Send + Sync {
    /// Which platform this adapter serves
    fn platform(&self) -> Platform;

    /// Root configuration directory (e.g., ~/.claude)
    fn config_dir(&self) -> PathBuf;

    /// True when the platform's config directory exists
    fn is_available(&self) -> bool;

    /// Files and directories this adapter may modify
    fn backup_paths(&self) -> Vec<PathBuf>;

    // --- Skills ---

    fn skill_dir(&self) -> Option<PathBuf>;

    /// Writes the skill, replacing an existing one with the same name
    fn install_skill(&self, skill: &Skill) -> Result<WriteReport>;

    fn uninstall_skill(&self, name: &str) -> Result<()>;

    fn list_skills(&self) -> Result<Vec<SkillInfo>>;

    fn get_skill(&self, name: &str) -> Result<Skill>;

    fn exists_skill(&self, name: &str) -> Result<bool>;

    // --- Agents ---

    fn agent_dir(&self) -> Option<PathBuf>;

    fn install_agent(&self, agent: &Agent) -> Result<WriteReport>;

    fn uninstall_agent(&self, name: &str) -> Result<()>;

    fn list_agents(&self) -> Result<Vec<AgentInfo>>;

    fn get_agent(&self, name: &str) -> Result<Agent>;

    fn exists_agent(&self, name: &str) -> Result<bool>;

    // --- Commands ---

    fn command_dir(&self) -> Option<PathBuf>;

    fn install_command(&self, command: &Command) -> Result<WriteReport>;

    fn uninstall_command(&self, name: &str) -> Result<()>;

    fn list_commands(&self) -> Result<Vec<CommandInfo>>;

    fn get_command(&self, name: &str) -> Result<Command>;

    fn exists_command(&self, name: &str) -> Result<bool>;

    // --- MCP servers ---

    /// File holding the platform's MCP server definitions
    fn mcp_config_path(&self) -> PathBuf;

    /// Adds or replaces a server
    fn add_mcp(&self, server: &McpServer) -> Result<WriteReport>;

    /// Removes a server; returns false when there was nothing to remove
    fn remove_mcp(&self, name: &str) -> Result<bool>;

    fn list_mcp(&self) -> Result<Vec<McpInfo>>;

    fn get_mcp(&self, name: &str) -> Result<McpServer>;

    /// Clears the disabled flag; a missing server is an error
    fn enable_mcp(&self, name: &str) -> Result<()>;

    /// Sets the disabled flag; a missing server is an error
    fn disable_mcp(&self, name: &str) -> Result<()>;
}
