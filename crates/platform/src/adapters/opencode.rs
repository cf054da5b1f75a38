//! OpenCode adapter.
//!
//! - Skills: `<config-home>/opencode/skill/<name>/SKILL.md`
//! - Agents: `<config-home>/opencode/agent/<name>.md`
//! - Commands: `<config-home>/opencode/command/<name>.md`
//! - MCP servers: `mcp` in `<config-home>/opencode/opencode.json`
//!
//! OpenCode MCP entries differ from the canonical shape: `type` is
//! `local`/`remote`, `command` is one list holding the program and its
//! arguments, `environment` replaces `env`, and `enabled` replaces
//! `disabled`.

use aix_backup::BackupManager;
use aix_state::{ArtifactKind, Paths, Platform};
use aix_validate::{Agent, AgentMeta, Command, CommandMeta, Skill, SkillMeta};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::markdown;
use super::mcp_json::{self, Document};
use super::traits::PlatformAdapter;
use super::AdapterBase;
use crate::common::{AgentInfo, CommandInfo, McpInfo, McpServer, McpTransport, SkillInfo};
use crate::report::WriteReport;
use crate::Result;

const MCP_KEY: &str = "mcp";
const TARGET: Platform = Platform::OpenCode;

/// Adapter for OpenCode configuration.
#[derive(Debug, Clone)]
pub struct OpenCodeAdapter {
    base: AdapterBase,
}

impl OpenCodeAdapter {
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

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<()> {
        let not_found = self.base.not_found(ArtifactKind::Mcp, name);
        self.edit_servers(|servers| {
            let entry = servers
                .get_mut(name)
                .and_then(Value::as_object_mut)
                .ok_or(not_found)?;
            entry.insert("enabled".into(), Value::Bool(enabled));
            Ok(())
        })
    }
}

fn encode_server(server: &McpServer, report: &mut WriteReport) -> Result<Value> {
    let transport = server.validate()?;
    let stdio = transport == McpTransport::Stdio;
    mcp_json::drop_unportable(server, stdio, false, TARGET, report);

    let mut entry = Map::new();
    if stdio {
        let mut command = vec![server.command.clone().unwrap_or_default()];
        command.extend(server.args.iter().cloned());
        entry.insert("type".into(), Value::String("local".into()));
        entry.insert("command".into(), mcp_json::list_value(&command));
        if !server.env.is_empty() {
            entry.insert("environment".into(), mcp_json::map_value(&server.env));
        }
    } else {
        entry.insert("type".into(), Value::String("remote".into()));
        entry.insert("url".into(), Value::String(server.url.clone().unwrap_or_default()));
        if !server.headers.is_empty() {
            entry.insert("headers".into(), mcp_json::map_value(&server.headers));
        }
    }
    entry.insert("enabled".into(), Value::Bool(!server.disabled));
    Ok(Value::Object(entry))
}

fn decode_server(name: &str, value: &Value) -> Option<McpServer> {
    let Some(entry) = value.as_object() else {
        tracing::warn!(server = name, "MCP server entry is not an object, skipping");
        return None;
    };

    // `command` is normally `[program, args...]`; a bare string is accepted.
    let (command, mut args) = match entry.get("command") {
        Some(Value::String(cmd)) => (Some(cmd.clone()), Vec::new()),
        Some(Value::Array(_)) => {
            let mut parts = mcp_json::string_list(entry, "command", name).into_iter();
            (parts.next(), parts.collect())
        }
        _ => (None, Vec::new()),
    };
    args.extend(mcp_json::string_list(entry, "args", name));

    let url = mcp_json::str_field(entry, "url");
    let transport = match mcp_json::str_field(entry, "type") {
        Some(t) => McpTransport::from_native(&t),
        None if url.is_some() => Some(McpTransport::Sse),
        None if command.is_some() => Some(McpTransport::Stdio),
        None => None,
    };
    let mut env = mcp_json::string_map(entry, "environment", name);
    env.extend(mcp_json::string_map(entry, "env", name));

    Some(McpServer {
        name: name.to_string(),
        transport,
        command,
        args,
        url,
        env,
        headers: mcp_json::string_map(entry, "headers", name),
        disabled: !mcp_json::bool_field(entry, "enabled").unwrap_or(true),
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

fn project_agent(agent: &Agent, report: &mut WriteReport) -> Agent {
    let item = format!("agent '{}'", agent.name());
    if !agent.meta.tools.is_empty() {
        report.drop_field(TARGET, &item, "tools");
    }
    if agent.meta.color.is_some() {
        report.drop_field(TARGET, &item, "color");
    }
    Agent {
        meta: AgentMeta {
            tools: Vec::new(),
            color: None,
            ..agent.meta.clone()
        },
        body: agent.body.clone(),
    }
}

fn project_command(command: &Command, report: &mut WriteReport) -> CommandMeta {
    let item = format!("command '{}'", command.name());
    let meta = &command.meta;
    if meta.argument_hint.is_some() {
        report.drop_field(TARGET, &item, "argument-hint");
    }
    if !meta.allowed_tools.is_empty() {
        report.drop_field(TARGET, &item, "allowed-tools");
    }
    if meta.context.is_some() {
        report.drop_field(TARGET, &item, "context");
    }
    if meta.hooks.is_some() {
        report.drop_field(TARGET, &item, "hooks");
    }
    CommandMeta {
        name: String::new(),
        description: meta.description.clone(),
        agent: meta.agent.clone(),
        model: meta.model.clone(),
        extra: meta.extra.clone(),
        ..Default::default()
    }
}

impl PlatformAdapter for OpenCodeAdapter {
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
        self.base.dir(ArtifactKind::Agent)
    }

    fn install_agent(&self, agent: &Agent) -> Result<WriteReport> {
        let mut report = WriteReport::new();
        let projected = project_agent(agent, &mut report);
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
        self.set_enabled(name, true)
    }

    fn disable_mcp(&self, name: &str) -> Result<()> {
        self.set_enabled(name, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn adapter(home: &std::path::Path) -> OpenCodeAdapter {
        OpenCodeAdapter::new(&Paths::with_home(home))
    }

    #[test]
    fn stdio_server_uses_local_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let a = adapter(tmp.path());
        let mut server = McpServer::stdio("fs", "npx", vec!["-y".into(), "server-fs".into()]);
        server.env.insert("ROOT".into(), "/tmp".into());
        server.platforms = vec!["linux".into()];

        let report = a.add_mcp(&server).unwrap();
        assert_eq!(report.dropped_fields(), vec!["platforms"]);

        let raw = fs::read_to_string(tmp.path().join(".config/opencode/opencode.json")).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            doc["mcp"]["fs"],
            json!({
                "type": "local",
                "command": ["npx", "-y", "server-fs"],
                "environment": {"ROOT": "/tmp"},
                "enabled": true
            })
        );

        let back = a.get_mcp("fs").unwrap();
        assert_eq!(back.command.as_deref(), Some("npx"));
        assert_eq!(back.args, vec!["-y", "server-fs"]);
        assert_eq!(back.env.get("ROOT").map(String::as_str), Some("/tmp"));
        assert!(back.platforms.is_empty());
    }

    #[test]
    fn remote_server_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let a = adapter(tmp.path());
        let mut server = McpServer::sse("docs", "https://example.com/mcp");
        server.headers.insert("X-Key".into(), "k".into());
        a.add_mcp(&server).unwrap();
        assert_eq!(a.get_mcp("docs").unwrap(), server);
    }

    #[test]
    fn disable_flips_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let a = adapter(tmp.path());
        a.add_mcp(&McpServer::stdio("fs", "npx", vec![])).unwrap();
        a.disable_mcp("fs").unwrap();
        assert!(a.get_mcp("fs").unwrap().disabled);
        assert!(a.list_mcp().unwrap()[0].disabled);
        a.enable_mcp("fs").unwrap();
        assert!(!a.get_mcp("fs").unwrap().disabled);
    }

    #[test]
    fn command_keeps_only_supported_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let a = adapter(tmp.path());
        let cmd = Command {
            meta: CommandMeta {
                name: "test".into(),
                description: "Run tests".into(),
                agent: Some("build".into()),
                argument_hint: Some("[filter]".into()),
                allowed_tools: vec!["Bash".into()],
                ..Default::default()
            },
            body: "Run the tests".into(),
            source_dir: None,
        };
        let report = a.install_command(&cmd).unwrap();
        assert_eq!(report.dropped_fields(), vec!["argument-hint", "allowed-tools"]);

        let back = a.get_command("test").unwrap();
        assert_eq!(back.meta.agent.as_deref(), Some("build"));
        assert_eq!(back.meta.argument_hint, None);
        assert!(tmp.path().join(".config/opencode/command/test.md").is_file());
    }
}
