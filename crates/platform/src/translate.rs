//! Copies one artifact from one platform to another through the canonical form.

use aix_state::{AixError, ArtifactKind};
use tracing::info;

use crate::adapters::PlatformAdapter;
use crate::orchestrator::mcp_exists;
use crate::report::WriteReport;
use crate::Result;

/// Reads `name` from `source` and installs it on `target`.
///
/// Fields the target cannot store are dropped and listed in the returned
/// report's warnings. Without `force` an existing artifact on the target is a
/// conflict.
pub fn translate(
    kind: ArtifactKind,
    name: &str,
    source: &dyn PlatformAdapter,
    target: &dyn PlatformAdapter,
    force: bool,
) -> Result<WriteReport> {
    let (from, to) = (source.platform(), target.platform());
    if from == to {
        return Err(AixError::Validation {
            subject: format!("translation of {kind} '{name}'"),
            issues: vec![format!("source and target are both {from}")],
        }
        .into());
    }

    if !force && exists(kind, name, target)? {
        return Err(AixError::conflict(format!("{kind} '{name}'"), to.as_str()).into());
    }

    let report = match kind {
        ArtifactKind::Skill => target.install_skill(&source.get_skill(name)?)?,
        ArtifactKind::Agent => target.install_agent(&source.get_agent(name)?)?,
        ArtifactKind::Command => target.install_command(&source.get_command(name)?)?,
        ArtifactKind::Mcp => target.add_mcp(&source.get_mcp(name)?)?,
    };
    info!(kind = %kind, name, from = %from, to = %to, dropped = report.dropped_fields().len(), "Translated artifact");
    Ok(report)
}

fn exists(kind: ArtifactKind, name: &str, adapter: &dyn PlatformAdapter) -> Result<bool> {
    match kind {
        ArtifactKind::Skill => adapter.exists_skill(name),
        ArtifactKind::Agent => adapter.exists_agent(name),
        ArtifactKind::Command => adapter.exists_command(name),
        ArtifactKind::Mcp => mcp_exists(adapter, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClaudeAdapter, CodexAdapter, GeminiAdapter, OpenCodeAdapter};
    use crate::common::McpServer;
    use aix_backup::{classify, BackupManager};
    use aix_state::{ErrorKind, Paths};
    use aix_validate::{Agent, AgentMeta, Command, CommandMeta};

    struct Sandbox {
        _tmp: tempfile::TempDir,
        paths: Paths,
        backups: BackupManager,
    }

    fn sandbox() -> Sandbox {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let backups = BackupManager::new(&paths);
        Sandbox {
            _tmp: tmp,
            paths,
            backups,
        }
    }

    #[test]
    fn mcp_moves_between_formats() {
        let sb = sandbox();
        let claude = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let codex = CodexAdapter::with_backups(&sb.paths, sb.backups.clone());

        let mut server = McpServer::stdio("github", "npx", vec!["-y".into(), "gh-mcp".into()]);
        server.env.insert("TOKEN".into(), "t".into());
        claude.add_mcp(&server).unwrap();

        let report = translate(ArtifactKind::Mcp, "github", &claude, &codex, false).unwrap();
        assert!(report.warnings.is_empty());
        assert_eq!(
            codex.get_mcp("github").unwrap().portable_view(),
            server.portable_view()
        );
    }

    #[test]
    fn agent_fields_are_projected() {
        let sb = sandbox();
        let claude = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let opencode = OpenCodeAdapter::with_backups(&sb.paths, sb.backups.clone());

        let agent = Agent {
            meta: AgentMeta {
                name: "planner".into(),
                description: "Plans work".into(),
                tools: vec!["Read".into()],
                ..Default::default()
            },
            body: "Plan first.".into(),
        };
        claude.install_agent(&agent).unwrap();

        let report = translate(ArtifactKind::Agent, "planner", &claude, &opencode, false).unwrap();
        assert_eq!(report.dropped_fields(), vec!["tools"]);
        let copied = opencode.get_agent("planner").unwrap();
        assert_eq!(copied.body, "Plan first.");
        assert!(copied.meta.tools.is_empty());
    }

    #[test]
    fn existing_target_needs_force() {
        let sb = sandbox();
        let claude = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let gemini = GeminiAdapter::with_backups(&sb.paths, sb.backups.clone());

        let command = Command {
            meta: CommandMeta {
                name: "fix".into(),
                description: "Fix it".into(),
                ..Default::default()
            },
            body: "Fix $ARGUMENTS".into(),
            source_dir: None,
        };
        claude.install_command(&command).unwrap();
        gemini.install_command(&command).unwrap();

        let err = translate(ArtifactKind::Command, "fix", &claude, &gemini, false).unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Conflict);
        translate(ArtifactKind::Command, "fix", &claude, &gemini, true).unwrap();
    }

    #[test]
    fn same_platform_is_rejected() {
        let sb = sandbox();
        let a = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let b = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let err = translate(ArtifactKind::Skill, "x", &a, &b, false).unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Validation);
    }

    #[test]
    fn unsupported_target_kind() {
        let sb = sandbox();
        let claude = ClaudeAdapter::with_backups(&sb.paths, sb.backups.clone());
        let codex = CodexAdapter::with_backups(&sb.paths, sb.backups.clone());
        let agent = Agent {
            meta: AgentMeta {
                name: "planner".into(),
                description: "Plans work".into(),
                ..Default::default()
            },
            body: "Plan.".into(),
        };
        claude.install_agent(&agent).unwrap();

        let err = translate(ArtifactKind::Agent, "planner", &claude, &codex, false).unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Unsupported);
    }
}
