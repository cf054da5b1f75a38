//! Gemini CLI adapter.
//!
//! - Skills: `~/.gemini/skills/<name>/SKILL.md`
//! - Commands: `~/.gemini/commands/<name>.toml` holding `description` and
//!   `prompt`
//! - MCP servers: `mcpServers` in `~/.gemini/settings.json`
//!
//! Gemini has no per-server disabled flag; disabled servers are listed in
//! `mcp.excluded`. Prompts refer to their arguments as `{{args}}` where the
//! canonical form uses `$ARGUMENTS`.

use aix_backup::BackupManager;
use aix_state::{AixError, ArtifactKind, Paths, Platform};
use aix_validate::{Agent, Command, CommandMeta, Skill, SkillMeta};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::markdown;
use super::mcp_json::{self, Document};
use super::traits::PlatformAdapter;
use super::AdapterBase;
use crate::common::{AgentInfo, CommandInfo, McpInfo, McpServer, McpTransport, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

const MCP_KEY: &str = "mcpServers";
const MCP_SETTINGS_KEY: &str = "mcp";
const EXCLUDED_KEY: &str = "excluded";
const TARGET: Platform = Platform::Gemini;

const CANONICAL_ARGS: &str = "$ARGUMENTS";
const GEMINI_ARGS: &str = "{{args}}";

/// Adapter for Gemini CLI configuration.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    base: AdapterBase,
}

impl GeminiAdapter {
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
        let doc = mcp_json::load(&path)?;
        let excluded = excluded_names(&doc);
        let Some(section) = mcp_json::section(&doc, MCP_KEY, &path)? else {
            return Ok(Vec::new());
        };
        Ok(section
            .iter()
            .filter_map(|(name, value)| decode_server(name, value))
            .map(|mut server| {
                server.disabled = excluded.contains(&server.name);
                server
            })
            .collect())
    }

    fn edit_settings<F>(&self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Document, &Path) -> Result<()>,
    {
        let path = self.mcp_config_path();
        let mut doc = mcp_json::load(&path)?;
        edit(&mut doc, &path)?;
        self.base.backup()?;
        mcp_json::save(&path, &doc)
    }

    fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        let not_found = self.base.not_found(ArtifactKind::Mcp, name);
        self.edit_settings(|doc, path| {
            let present = mcp_json::section(doc, MCP_KEY, path)?.is_some_and(|s| s.contains_key(name));
            if !present {
                return Err(not_found.into());
            }
            set_excluded(doc, name, disabled, path)
        })
    }

    fn command_path(&self, name: &str) -> Result<PathBuf> {
        markdown::item_path(&self.base, ArtifactKind::Command, name, "toml")
    }

    fn unsupported<T>(&self) -> Result<T> {
        Err(AixError::unsupported(TARGET.as_str(), "managing agents").into())
    }
}

fn excluded_names(doc: &Document) -> Vec<String> {
    doc.get(MCP_SETTINGS_KEY)
        .and_then(Value::as_object)
        .map(|mcp| mcp_json::string_list(mcp, EXCLUDED_KEY, MCP_SETTINGS_KEY))
        .unwrap_or_default()
}

/// Adds `name` to, or removes it from, `mcp.excluded`.
fn set_excluded(doc: &mut Document, name: &str, excluded: bool, path: &Path) -> Result<()> {
    let mut names = excluded_names(doc);
    names.retain(|n| n != name);
    if excluded {
        names.push(name.to_string());
    }
    let settings = mcp_json::section_mut(doc, MCP_SETTINGS_KEY, path)?;
    if names.is_empty() {
        settings.remove(EXCLUDED_KEY);
    } else {
        settings.insert(EXCLUDED_KEY.into(), mcp_json::list_value(&names));
    }
    if settings.is_empty() {
        doc.remove(MCP_SETTINGS_KEY);
    }
    Ok(())
}

fn encode_server(server: &McpServer, report: &mut WriteReport) -> Result<Value> {
    let transport = server.validate()?;
    let stdio = transport == McpTransport::Stdio;
    mcp_json::drop_unportable(server, stdio, false, TARGET, report);

    let mut entry = Map::new();
    if stdio {
        entry.insert("command".into(), Value::String(server.command.clone().unwrap_or_default()));
        if !server.args.is_empty() {
            entry.insert("args".into(), mcp_json::list_value(&server.args));
        }
        if !server.env.is_empty() {
            entry.insert("env".into(), mcp_json::map_value(&server.env));
        }
    } else {
        entry.insert("url".into(), Value::String(server.url.clone().unwrap_or_default()));
        if !server.headers.is_empty() {
            entry.insert("headers".into(), mcp_json::map_value(&server.headers));
        }
    }
    Ok(Value::Object(entry))
}

fn decode_server(name: &str, value: &Value) -> Option<McpServer> {
    let Some(entry) = value.as_object() else {
        warn!(server = name, "MCP server entry is not an object, skipping");
        return None;
    };
    let command = mcp_json::str_field(entry, "command");
    let url = mcp_json::str_field(entry, "url").or_else(|| mcp_json::str_field(entry, "httpUrl"));
    let transport = match (&command, &url) {
        (_, Some(_)) => Some(McpTransport::Sse),
        (Some(_), None) => Some(McpTransport::Stdio),
        (None, None) => None,
    };
    Some(McpServer {
        name: name.to_string(),
        transport,
        command,
        args: mcp_json::string_list(entry, "args", name),
        url,
        env: mcp_json::string_map(entry, "env", name),
        headers: mcp_json::string_map(entry, "headers", name),
        disabled: false,
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

/// Renders a command as Gemini TOML.
fn encode_command(command: &Command, report: &mut WriteReport) -> Result<String> {
    let item = format!("command '{}'", command.name());
    let meta = &command.meta;
    let dropped = [
        ("agent", meta.agent.is_some()),
        ("model", meta.model.is_some()),
        ("argument-hint", meta.argument_hint.is_some()),
        ("allowed-tools", !meta.allowed_tools.is_empty()),
        ("context", meta.context.is_some()),
        ("hooks", meta.hooks.is_some()),
    ];
    for (field, present) in dropped {
        if present {
            report.drop_field(TARGET, &item, field);
        }
    }
    for key in meta.extra.keys() {
        report.drop_field(TARGET, &item, key);
    }

    let mut table = toml::Table::new();
    if !meta.description.is_empty() {
        table.insert("description".into(), toml::Value::String(meta.description.clone()));
    }
    table.insert(
        "prompt".into(),
        toml::Value::String(command.body.replace(CANONICAL_ARGS, GEMINI_ARGS)),
    );
    toml::to_string_pretty(&table).map_err(|e| {
        AixError::Marshal {
            format: "toml",
            message: e.to_string(),
        }
        .into()
    })
}

fn decode_command(name: &str, path: &Path) -> Result<Command> {
    let text = fs::read_to_string(path).map_err(|e| AixError::io("reading", path, e))?;
    let table: toml::Table =
        toml::from_str(&text).map_err(|e| AixError::parse(path, e.message().to_string()))?;
    let field = |key: &str| {
        table
            .get(key)
            .and_then(toml::Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Ok(Command {
        meta: CommandMeta {
            name: name.to_string(),
            description: field("description"),
            ..Default::default()
        },
        body: field("prompt").replace(GEMINI_ARGS, CANONICAL_ARGS),
        source_dir: None,
    })
}

impl PlatformAdapter for GeminiAdapter {
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
        let path = self.command_path(command.name())?;
        let rendered = encode_command(command, &mut report)?;
        let item = format!("command '{}'", command.name());
        markdown::write_file(&self.base, &path, &rendered, &item, &mut report)?;
        Ok(report)
    }

    fn uninstall_command(&self, name: &str) -> Result<()> {
        let path = self.command_path(name)?;
        markdown::remove_file(&self.base, ArtifactKind::Command, name, &path)
    }

    fn list_commands(&self) -> Result<Vec<CommandInfo>> {
        let dir = self.base.require_dir(ArtifactKind::Command)?;
        let mut infos = Vec::new();
        for path in markdown::files_with_extension(&dir, "toml")? {
            let name = markdown::stem(&path);
            match decode_command(&name, &path) {
                Ok(command) => infos.push(CommandInfo {
                    name,
                    description: command.meta.description,
                    path,
                }),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable command"),
            }
        }
        Ok(infos)
    }

    fn get_command(&self, name: &str) -> Result<Command> {
        let path = self.command_path(name)?;
        if !path.is_file() {
            return Err(self.base.not_found(ArtifactKind::Command, name).into());
        }
        decode_command(name, &path)
    }

    fn exists_command(&self, name: &str) -> Result<bool> {
        Ok(self.command_path(name)?.is_file())
    }

    fn mcp_config_path(&self) -> PathBuf {
        self.base.mcp_path()
    }

    fn add_mcp(&self, server: &McpServer) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        let entry = encode_server(server, &mut report)?;
        self.edit_settings(|doc, path| {
            mcp_json::section_mut(doc, MCP_KEY, path)?.insert(server.name.clone(), entry);
            set_excluded(doc, &server.name, server.disabled, path)
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
        self.edit_settings(|doc, path| {
            mcp_json::section_mut(doc, MCP_KEY, path)?.remove(name);
            set_excluded(doc, name, false, path)
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
