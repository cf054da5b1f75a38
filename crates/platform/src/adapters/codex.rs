//! Codex CLI adapter.
//!
//! - Skills: `~/.codex/skills/<name>/SKILL.md`
//! - Commands (prompts): `~/.codex/prompts/<name>.md`
//! - MCP servers: `[mcp_servers.<name>]` tables in `~/.codex/config.toml`
//!
//! Codex has no agent files. Prompt frontmatter only understands
//! `description` and `argument-hint`.

use aix_backup::BackupManager;
use aix_state::{
    atomic_write_toml, existing_mode_or, AixError, ArtifactKind, Paths, Platform,
    DEFAULT_FILE_MODE,
};
use aix_validate::{Agent, Command, CommandMeta, Skill, SkillMeta};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::warn;

use super::markdown;
use super::mcp_json::drop_unportable;
use super::traits::PlatformAdapter;
use super::AdapterBase;
use crate::common::{AgentInfo, CommandInfo, McpInfo, McpServer, McpTransport, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

const MCP_KEY: &str = "mcp_servers";
const TARGET: Platform = Platform::Codex;

/// Adapter for Codex CLI configuration.
#[derive(Debug, Clone)]
pub struct CodexAdapter {
    base: AdapterBase,
}

impl CodexAdapter {
    pub fn new(paths: &Paths) -> Self {
        Self {
            base: AdapterBase::new(TARGET, paths),
        }
    }

    /// Creates an adapter that backs up into `backups` (for testing).
    pub fn with_backups(paths: &Paths, backups: BackupManager) -> Self {
        Self {
            base: AdapterBase::with_backups(TARGET, paths, backups),
        }
    }

    fn load_servers(&self) -> Result<Vec<McpServer>> {
        let path = self.mcp_config_path();
        let config = load_table(&path)?;
        let Some(section) = servers_section(&config, &path)? else {
            return Ok(Vec::new());
        };
        Ok(section
            .iter()
            .filter_map(|(name, value)| decode_server(name, value))
            .collect())
    }

    fn edit_servers<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Table) -> Result<()>,
    {
        let path = self.mcp_config_path();
        let mut config = load_table(&path)?;
        let slot = config.entry(MCP_KEY).or_insert(Value::Table(Table::new()));
        let servers = slot
            .as_table_mut()
            .ok_or_else(|| AixError::parse(&path, format!("'{MCP_KEY}' must be a table")))?;
        edit(servers)?;
        self.base.backup()?;
        atomic_write_toml(&path, &config, existing_mode_or(&path, DEFAULT_FILE_MODE))?;
        Ok(())
    }

    fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        let not_found = self.base.not_found(ArtifactKind::Mcp, name);
        self.edit_servers(|servers| {
            let entry = servers
                .get_mut(name)
                .and_then(Value::as_table_mut)
                .ok_or(not_found)?;
            if disabled {
                entry.insert("enabled".into(), Value::Boolean(false));
            } else {
                entry.remove("enabled");
            }
            Ok(())
        })
    }

    fn unsupported<T>(&self) -> Result<T> {
        Err(AixError::unsupported(TARGET.as_str(), "managing agents").into())
    }
}

fn load_table(path: &Path) -> Result<Table> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Table::new()),
        Err(e) => return Err(AixError::io("reading", path, e).into()),
    };
    toml::from_str::<Table>(&text).map_err(|e| AixError::parse(path, e.message().to_string()).into())
}

fn servers_section<'a>(config: &'a Table, path: &Path) -> Result<Option<&'a Table>> {
    match config.get(MCP_KEY) {
        None => Ok(None),
        Some(Value::Table(t)) => Ok(Some(t)),
        Some(_) => Err(AixError::parse(path, format!("'{MCP_KEY}' must be a table")).into()),
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn string_table(map: &BTreeMap<String, String>) -> Value {
    Value::Table(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// String array under `key`; non-string entries are skipped with a warning.
fn read_strings(entry: &Table, key: &str, server: &str) -> Vec<String> {
    let Some(value) = entry.get(key) else {
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        warn!(server, field = key, "Expected an array, ignoring");
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|v| match v.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                warn!(server, field = key, value = %v, "Skipping non-string entry");
                None
            }
        })
        .collect()
}

/// String table under `key`; non-string values are skipped with a warning.
fn read_string_table(entry: &Table, key: &str, server: &str) -> BTreeMap<String, String> {
    let Some(value) = entry.get(key) else {
        return BTreeMap::new();
    };
    let Some(table) = value.as_table() else {
        warn!(server, field = key, "Expected a table, ignoring");
        return BTreeMap::new();
    };
    table
        .iter()
        .filter_map(|(k, v)| match v.as_str() {
            Some(s) => Some((k.clone(), s.to_string())),
            None => {
                warn!(server, field = key, key = %k, "Skipping non-string value");
                None
            }
        })
        .collect()
}

fn encode_server(server: &McpServer, report: &mut WriteReport) -> Result<Value> {
    let transport = server.validate()?;
    let stdio = transport == McpTransport::Stdio;
    drop_unportable(server, stdio, false, TARGET, report);

    let mut entry = Table::new();
    if stdio {
        entry.insert("command".into(), Value::String(server.command.clone().unwrap_or_default()));
        if !server.args.is_empty() {
            entry.insert("args".into(), string_array(&server.args));
        }
        if !server.env.is_empty() {
            entry.insert("env".into(), string_table(&server.env));
        }
    } else {
        entry.insert("url".into(), Value::String(server.url.clone().unwrap_or_default()));
        if !server.headers.is_empty() {
            entry.insert("http_headers".into(), string_table(&server.headers));
        }
    }
    if server.disabled {
        entry.insert("enabled".into(), Value::Boolean(false));
    }
    Ok(Value::Table(entry))
}

fn decode_server(name: &str, value: &Value) -> Option<McpServer> {
    let Some(entry) = value.as_table() else {
        warn!(server = name, "MCP server entry is not a table, skipping");
        return None;
    };
    let command = entry.get("command").and_then(Value::as_str).map(str::to_string);
    let url = entry.get("url").and_then(Value::as_str).map(str::to_string);
    let transport = match (&command, &url) {
        (_, Some(_)) => Some(McpTransport::Sse),
        (Some(_), None) => Some(McpTransport::Stdio),
        (None, None) => None,
    };
    Some(McpServer {
        name: name.to_string(),
        transport,
        command,
        args: read_strings(entry, "args", name),
        url,
        env: read_string_table(entry, "env", name),
        headers: read_string_table(entry, "http_headers", name),
        disabled: !entry.get("enabled").and_then(Value::as_bool).unwrap_or(true),
        platforms: Vec::new(),
    })
}

fn project_skill(skill: &Skill, report: &mut WriteReport) -> SkillMeta {
    if !skill.meta.allowed_tools.is_empty() {
        report.drop_field(TARGET, &format!("skill '{}'", skill.name()), "allowed-tools");
    }
    SkillMeta {
        allowed_tools: Vec::new(),
        ..skill.meta.clone()
    }
}

fn project_command(command: &Command, report: &mut WriteReport) -> CommandMeta {
    let item = format!("command '{}'", command.name());
    let meta = &command.meta;
    let dropped = [
        ("agent", meta.agent.is_some()),
        ("model", meta.model.is_some()),
        ("allowed-tools", !meta.allowed_tools.is_empty()),
        ("context", meta.context.is_some()),
        ("hooks", meta.hooks.is_some()),
    ];
    for (field, present) in dropped {
        if present {
            report.drop_field(TARGET, &item, field);
        }
    }
    CommandMeta {
        description: meta.description.clone(),
        argument_hint: meta.argument_hint.clone(),
        extra: meta.extra.clone(),
        ..Default::default()
    }
}

impl PlatformAdapter for CodexAdapter {
    fn platform(&self) -> Platform {
        TARGET
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
        let meta = project_skill(skill, &mut report);
        markdown::install_skill(&self.base, skill, &meta, &mut report)?;
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
        None
    }

    fn install_agent(&self, _agent: &Agent) -> Result<WriteReport> {
        self.unsupported()
    }

    fn uninstall_agent(&self, _name: &str) -> Result<()> {
        self.unsupported()
    }

    fn list_agents(&self) -> Result<Vec<AgentInfo>> {
        self.unsupported()
    }

    fn get_agent(&self, _name: &str) -> Result<Agent> {
        self.unsupported()
    }

    fn exists_agent(&self, _name: &str) -> Result<bool> {
        self.unsupported()
    }

    fn command_dir(&self) -> Option<PathBuf> {
        self.base.dir(ArtifactKind::Command)
    }

    fn install_command(&self, command: &Command) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        let meta = project_command(command, &mut report);
        markdown::install_command(&self.base, command.name(), &meta, &command.body, &mut report)?;
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
        let config = load_table(&path)?;
        let present = servers_section(&config, &path)?.is_some_and(|s| s.contains_key(name));
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
