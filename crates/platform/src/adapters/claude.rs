//! Claude Code adapter.
//!
//! - Skills: `~/.claude/skills/<name>/SKILL.md`
//! - Agents: `~/.claude/agents/<name>.md`
//! - Commands: `~/.claude/commands/<name>.md`
//! - MCP servers: `mcpServers` in `~/.claude.json` (in the home directory,
//!   not under `~/.claude/`)
//!
//! Claude is the richest target: every canonical field except the
//! OpenCode-only agent settings is stored as-is.

use aix_backup::BackupManager;
use aix_state::{ArtifactKind, Paths, Platform};
use aix_validate::{Agent, AgentMeta, Command, Skill};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::markdown;
use super::mcp_json::{self, Document};
use super::traits::PlatformAdapter;
use super::AdapterBase;
use crate::common::{AgentInfo, CommandInfo, McpInfo, McpServer, McpTransport, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

const MCP_KEY: &str = "mcpServers";

/// Adapter for Claude Code configuration.
#[derive(Debug, Clone)]
pub struct ClaudeAdapter {
    base: AdapterBase,
}

impl ClaudeAdapter {
    pub fn new(paths: &Paths) -> Self {
        Self {
            base: AdapterBase::new(Platform::Claude, paths),
        }
    }

    /// Creates an adapter that backs up into `backups` (for testing).
    pub fn with_backups(paths: &Paths, backups: BackupManager) -> Self {
        Self {
            base: AdapterBase::with_backups(Platform::Claude, paths, backups),
        }
    }

    fn load_servers(&self) -> Result<Vec<McpServer>> {
        let path = self.mcp_config_path();
        let doc = mcp_json::load(&path)?;
        let Some(section) = mcp_json::section(&doc, MCP_KEY, &path)? else {
            return Ok(Vec::new());
        };
        Ok(section
            .iter()
            .filter_map(|(name, value)| decode_server(name, value))
            .collect())
    }

    fn edit_servers<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Document) -> Result<()>,
    {
        let path = self.mcp_config_path();
        let mut doc = mcp_json::load(&path)?;
        edit(mcp_json::section_mut(&mut doc, MCP_KEY, &path)?)?;
        self.base.backup()?;
        mcp_json::save(&path, &doc)
    }

    fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        let not_found = self.base.not_found(ArtifactKind::Mcp, name);
        self.edit_servers(|servers| {
            let entry = servers
                .get_mut(name)
                .and_then(Value::as_object_mut)
                .ok_or(not_found)?;
            if disabled {
                entry.insert("disabled".into(), Value::Bool(true));
            } else {
                entry.remove("disabled");
            }
            Ok(())
        })
    }
}

/// Native JSON for one server.
fn encode_server(server: &McpServer, report: &mut WriteReport) -> Result<Value> {
    let transport = server.validate()?;
    mcp_json::drop_unportable(
        server,
        transport == McpTransport::Stdio,
        true,
        Platform::Claude,
        report,
    );

    let mut entry = Map::new();
    match transport {
        McpTransport::Stdio => {
            entry.insert("command".into(), Value::String(server.command.clone().unwrap_or_default()));
            if !server.args.is_empty() {
                entry.insert("args".into(), mcp_json::list_value(&server.args));
            }
            if !server.env.is_empty() {
                entry.insert("env".into(), mcp_json::map_value(&server.env));
            }
        }
        McpTransport::Sse => {
            entry.insert("type".into(), Value::String("sse".into()));
            entry.insert("url".into(), Value::String(server.url.clone().unwrap_or_default()));
            if !server.headers.is_empty() {
                entry.insert("headers".into(), mcp_json::map_value(&server.headers));
            }
        }
    }
    if server.disabled {
        entry.insert("disabled".into(), Value::Bool(true));
    }
    if !server.platforms.is_empty() {
        entry.insert("platforms".into(), mcp_json::list_value(&server.platforms));
    }
    Ok(Value::Object(entry))
}

fn decode_server(name: &str, value: &Value) -> Option<McpServer> {
    let Some(entry) = value.as_object() else {
        tracing::warn!(server = name, "MCP server entry is not an object, skipping");
        return None;
    };
    let command = mcp_json::str_field(entry, "command");
    let url = mcp_json::str_field(entry, "url");
    let transport = match mcp_json::str_field(entry, "type") {
        Some(t) => McpTransport::from_native(&t),
        None if url.is_some() => Some(McpTransport::Sse),
        None if command.is_some() => Some(McpTransport::Stdio),
        None => None,
    };
    Some(McpServer {
        name: name.to_string(),
        transport,
        command,
        args: mcp_json::string_list(entry, "args", name),
        url,
        env: mcp_json::string_map(entry, "env", name),
        headers: mcp_json::string_map(entry, "headers", name),
        disabled: mcp_json::bool_field(entry, "disabled").unwrap_or(false),
        platforms: mcp_json::string_list(entry, "platforms", name),
    })
}

impl PlatformAdapter for ClaudeAdapter {
    fn platform(&self) -> Platform {
        Platform::Claude
    }

    fn config_dir(&self) -> PathBuf {
        self.base.config_dir()
    }

    fn is_available(&self) -> bool {
        self.base.is_available()
    }

    fn backup_paths(&self) -> Vec<PathBuf> {
        self.base.backup_paths()
    }

    fn skill_dir(&self) -> Option<PathBuf> {
        self.base.dir(ArtifactKind::Skill)
    }

    fn install_skill(&self, skill: &Skill) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        markdown::install_skill(&self.base, skill, &skill.meta, &mut report)?;
        Ok(report)
    }

    fn uninstall_skill(&self, name: &str) -> Result<()> {
        markdown::uninstall_skill(&self.base, name)
    }

    fn list_skills(&self) -> Result<Vec<SkillInfo>> {
        markdown::list_skills(&self.base)
    }

    fn get_skill(&self, name: &str) -> Result<Skill> {
        markdown::get_skill(&self.base, name)
    }

    fn exists_skill(&self, name: &str) -> Result<bool> {
        markdown::exists_skill(&self.base, name)
    }

    fn agent_dir(&self) -> Option<PathBuf> {
        self.base.dir(ArtifactKind::Agent)
    }

    fn install_agent(&self, agent: &Agent) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        let item = format!("agent '{}'", agent.name());
        if agent.meta.mode.is_some() {
            report.drop_field(Platform::Claude, &item, "mode");
        }
        if agent.meta.temperature.is_some() {
            report.drop_field(Platform::Claude, &item, "temperature");
        }
        let projected = Agent {
            meta: AgentMeta {
                mode: None,
                temperature: None,
                ..agent.meta.clone()
            },
            body: agent.body.clone(),
        };
        markdown::install_agent(&self.base, &projected, &mut report)?;
        Ok(report)
    }

    fn uninstall_agent(&self, name: &str) -> Result<()> {
        let path = markdown::item_path(&self.base, ArtifactKind::Agent, name, "md")?;
        markdown::remove_file(&self.base, ArtifactKind::Agent, name, &path)
    }

    fn list_agents(&self) -> Result<Vec<AgentInfo>> {
        markdown::list_agents(&self.base)
    }

    fn get_agent(&self, name: &str) -> Result<Agent> {
        markdown::get_agent(&self.base, name)
    }

    fn exists_agent(&self, name: &str) -> Result<bool> {
        Ok(markdown::item_path(&self.base, ArtifactKind::Agent, name, "md")?.is_file())
    }

    fn command_dir(&self) -> Option<PathBuf> {
        self.base.dir(ArtifactKind::Command)
    }

    fn install_command(&self, command: &Command) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        markdown::install_command(
            &self.base,
            command.name(),
            &command.meta,
            &command.body,
            &mut report,
        )?;
        Ok(report)
    }

    fn uninstall_command(&self, name: &str) -> Result<()> {
        let path = markdown::item_path(&self.base, ArtifactKind::Command, name, "md")?;
        markdown::remove_file(&self.base, ArtifactKind::Command, name, &path)
    }

    fn list_commands(&self) -> Result<Vec<CommandInfo>> {
        markdown::list_commands(&self.base)
    }

    fn get_command(&self, name: &str) -> Result<Command> {
        markdown::get_command(&self.base, name)
    }

    fn exists_command(&self, name: &str) -> Result<bool> {
        Ok(markdown::item_path(&self.base, ArtifactKind::Command, name, "md")?.is_file())
    }

    fn mcp_config_path(&self) -> PathBuf {
        self.base.mcp_path()
    }

    fn add_mcp(&self, server: &McpServer) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        let entry = encode_server(server, &mut report)?;
        self.edit_servers(|servers| {
            servers.insert(server.name.clone(), entry);
            Ok(())
        })?;
        report.written += 1;
        Ok(report)
    }

    fn remove_mcp(&self, name: &str) -> Result<bool> {
        let path = self.mcp_config_path();
        let doc = mcp_json::load(&path)?;
        let present = mcp_json::section(&doc, MCP_KEY, &path)?.is_some_and(|s| s.contains_key(name));
        if !present {
            return Ok(false);
        }
        self.edit_servers(|servers| {
            servers.remove(name);
            Ok(())
        })?;
        Ok(true)
    }

    fn list_mcp(&self) -> Result<Vec<McpInfo>> {
        Ok(self.load_servers()?.iter().map(McpInfo::from_server).collect())
    }

    fn get_mcp(&self, name: &str) -> Result<McpServer> {
        self.load_servers()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| self.base.not_found(ArtifactKind::Mcp, name).into())
    }

    fn enable_mcp(&self, name: &str) -> Result<()> {
        self.set_disabled(name, false)
    }

    fn disable_mcp(&self, name: &str) -> Result<()> {
        self.set_disabled(name, true)
    }
}
