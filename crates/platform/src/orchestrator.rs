//! Runs one artifact operation across several platforms.
//!
//! Platforms are processed in the order given. A failure on one platform does
//! not undo the platforms before it; every outcome is reported to the
//! caller's writer as one line.

use aix_backup::classify;
use aix_state::{AixError, ArtifactKind, ErrorKind, Paths, Platform, ToolConfig};
use aix_validate::{
    validate_agent, validate_command, validate_skill, Agent, Command, Skill, ValidateOptions,
    ValidationIssue,
};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

use crate::adapters::{adapter_for, PlatformAdapter};
use crate::common::{Located, McpServer};
use crate::report::WriteReport;
use crate::Result;

/// Parameters for an install.
///
/// ```
/// use aix_platform::InstallParams;
///
/// let params = InstallParams { force: true, ..Default::default() };
/// assert!(params.force);
/// assert!(!params.strict);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct InstallParams {
    /// Overwrite an existing artifact with the same name
    pub force: bool,
    /// Validate in strict mode before writing
    pub strict: bool,
}

/// One platform's failure within a multi-platform operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformFailure {
    pub platform: Platform,
    pub kind: ErrorKind,
    pub message: String,
}

impl PlatformFailure {
    fn new(platform: Platform, err: &anyhow::Error) -> Self {
        Self {
            platform,
            kind: classify(err),
            message: format!("{err:#}"),
        }
    }
}

/// Outcome of installing one artifact on several platforms.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallSummary {
    pub installed: Vec<Platform>,
    /// Platforms that already held identical content
    pub unchanged: Vec<Platform>,
    pub failed: Vec<PlatformFailure>,
    pub warnings: Vec<String>,
}

impl InstallSummary {
    pub fn succeeded(&self) -> usize {
        self.installed.len() + self.unchanged.len()
    }
}

/// Outcome of removing, enabling or disabling one artifact on several
/// platforms.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplySummary {
    pub applied: Vec<Platform>,
    pub not_found: Vec<Platform>,
    pub unsupported: Vec<Platform>,
    pub failed: Vec<PlatformFailure>,
}

impl ApplySummary {
    /// Fails when no platform had the artifact.
    pub fn require_found(&self, kind: ArtifactKind, name: &str) -> Result<()> {
        if self.applied.is_empty() && self.failed.is_empty() {
            let searched: Vec<&str> = self
                .not_found
                .iter()
                .chain(&self.unsupported)
                .map(|p| p.as_str())
                .collect();
            return Err(AixError::not_found(
                format!("{kind} '{name}'"),
                format!("any platform ({})", searched.join(", ")),
            )
            .into());
        }
        Ok(())
    }
}

/// Picks the platforms a command targets: explicit flags, else the
/// configured defaults, else every platform whose config directory exists.
pub fn resolve_platforms(
    explicit: &[Platform],
    config: &ToolConfig,
    paths: &Paths,
) -> std::result::Result<Vec<Platform>, AixError> {
    let chosen = if !explicit.is_empty() {
        explicit.to_vec()
    } else if !config.default_platforms.is_empty() {
        config.default_platforms.clone()
    } else {
        paths.present_platforms()
    };

    let mut platforms = Vec::with_capacity(chosen.len());
    for p in chosen {
        if !platforms.contains(&p) {
            platforms.push(p);
        }
    }
    if platforms.is_empty() {
        return Err(AixError::not_found(
            "platform configuration",
            Platform::ALL
                .map(|p| paths.global_config_dir(p).display().to_string())
                .join(", "),
        ));
    }
    debug!(platforms = ?platforms, "Resolved target platforms");
    Ok(platforms)
}

/// Coordinates a set of adapters.
pub struct Orchestrator {
    adapters: Vec<Box<dyn PlatformAdapter>>,
}

impl Orchestrator {
    /// Creates an orchestrator over `adapters`, processed in order.
    pub fn new(adapters: Vec<Box<dyn PlatformAdapter>>) -> Self {
        Self { adapters }
    }

    /// Creates an orchestrator with the real adapters for `platforms`.
    pub fn for_platforms(paths: &Paths, platforms: &[Platform]) -> Self {
        Self::new(platforms.iter().map(|p| adapter_for(*p, paths)).collect())
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.iter().map(|a| a.platform()).collect()
    }

    pub fn adapters(&self) -> &[Box<dyn PlatformAdapter>] {
        &self.adapters
    }

    pub fn install_skill(
        &self,
        skill: &Skill,
        params: InstallParams,
        out: &mut dyn Write,
    ) -> Result<InstallSummary> {
        let issues = validate_skill(skill, options(params))
            .into_result(format!("skill '{}'", skill.name()))?;
        report_issues(&issues, out)?;
        self.install_each(
            ArtifactKind::Skill,
            skill.name(),
            params.force,
            out,
            |a| a.exists_skill(skill.name()),
            |a| a.install_skill(skill),
        )
    }

    pub fn install_agent(
        &self,
        agent: &Agent,
        params: InstallParams,
        out: &mut dyn Write,
    ) -> Result<InstallSummary> {
        let issues = validate_agent(agent, options(params))
            .into_result(format!("agent '{}'", agent.name()))?;
        report_issues(&issues, out)?;
        self.install_each(
            ArtifactKind::Agent,
            agent.name(),
            params.force,
            out,
            |a| a.exists_agent(agent.name()),
            |a| a.install_agent(agent),
        )
    }

    pub fn install_command(
        &self,
        command: &Command,
        params: InstallParams,
        out: &mut dyn Write,
    ) -> Result<InstallSummary> {
        let issues = validate_command(command, options(params))
            .into_result(format!("command '{}'", command.name()))?;
        report_issues(&issues, out)?;
        self.install_each(
            ArtifactKind::Command,
            command.name(),
            params.force,
            out,
            |a| a.exists_command(command.name()),
            |a| a.install_command(command),
        )
    }

    pub fn add_mcp(
        &self,
        server: &McpServer,
        params: InstallParams,
        out: &mut dyn Write,
    ) -> Result<InstallSummary> {
        server.validate()?;
        self.install_each(
            ArtifactKind::Mcp,
            &server.name,
            params.force,
            out,
            |a| mcp_exists(a, &server.name),
            |a| a.add_mcp(server),
        )
    }

    fn install_each<E, I>(
        &self,
        kind: ArtifactKind,
        name: &str,
        force: bool,
        out: &mut dyn Write,
        exists: E,
        install: I,
    ) -> Result<InstallSummary>
    where
        E: Fn(&dyn PlatformAdapter) -> Result<bool>,
        I: Fn(&dyn PlatformAdapter) -> Result<WriteReport>,
    {
        let mut summary = InstallSummary::default();
        let mut first_err = None;

        for adapter in &self.adapters {
            let adapter = adapter.as_ref();
            let platform = adapter.platform();
            let outcome = if force {
                install(adapter)
            } else {
                match exists(adapter) {
                    Ok(true) => {
                        Err(AixError::conflict(format!("{kind} '{name}'"), platform.as_str()).into())
                    }
                    Ok(false) => install(adapter),
                    Err(e) => Err(e),
                }
            };

            match outcome {
                Ok(report) => {
                    for warning in &report.warnings {
                        writeln!(out, "warning: {platform}: {warning}")?;
                        summary.warnings.push(format!("{platform}: {warning}"));
                    }
                    if report.is_unchanged() {
                        writeln!(out, "{platform}: {kind} '{name}' is up to date")?;
                        summary.unchanged.push(platform);
                    } else {
                        writeln!(out, "{platform}: installed {kind} '{name}'")?;
                        summary.installed.push(platform);
                    }
                }
                Err(e) => {
                    writeln!(out, "{platform}: failed: {e:#}")?;
                    summary.failed.push(PlatformFailure::new(platform, &e));
                    first_err.get_or_insert(e);
                }
            }
        }

        if summary.succeeded() == 0 {
            if let Some(e) = first_err {
                let platforms: Vec<&str> = summary.failed.iter().map(|f| f.platform.as_str()).collect();
                return Err(e.context(format!(
                    "{kind} '{name}' failed on every platform ({})",
                    platforms.join(", ")
                )));
            }
        }
        Ok(summary)
    }

    /// Removes the artifact wherever it exists. Platforms without it are
    /// reported, not treated as errors.
    pub fn remove(&self, kind: ArtifactKind, name: &str, out: &mut dyn Write) -> Result<ApplySummary> {
        self.apply_each(kind, name, "removed", out, |a| match kind {
            ArtifactKind::Skill => remove_if_present(a.exists_skill(name), || a.uninstall_skill(name)),
            ArtifactKind::Agent => remove_if_present(a.exists_agent(name), || a.uninstall_agent(name)),
            ArtifactKind::Command => {
                remove_if_present(a.exists_command(name), || a.uninstall_command(name))
            }
            ArtifactKind::Mcp => a.remove_mcp(name),
        })
    }

    pub fn enable_mcp(&self, name: &str, out: &mut dyn Write) -> Result<ApplySummary> {
        self.apply_each(ArtifactKind::Mcp, name, "enabled", out, |a| {
            found_or_missing(a.enable_mcp(name))
        })
    }

    pub fn disable_mcp(&self, name: &str, out: &mut dyn Write) -> Result<ApplySummary> {
        self.apply_each(ArtifactKind::Mcp, name, "disabled", out, |a| {
            found_or_missing(a.disable_mcp(name))
        })
    }

    // `op` returns Ok(false) when the platform does not have the artifact.
    fn apply_each<F>(
        &self,
        kind: ArtifactKind,
        name: &str,
        verb: &str,
        out: &mut dyn Write,
        op: F,
    ) -> Result<ApplySummary>
    where
        F: Fn(&dyn PlatformAdapter) -> Result<bool>,
    {
        let mut summary = ApplySummary::default();
        let mut first_err = None;

        for adapter in &self.adapters {
            let adapter = adapter.as_ref();
            let platform = adapter.platform();
            match op(adapter) {
                Ok(true) => {
                    writeln!(out, "{platform}: {verb} {kind} '{name}'")?;
                    summary.applied.push(platform);
                }
                Ok(false) => {
                    writeln!(out, "{kind} '{name}' not found on {platform}")?;
                    summary.not_found.push(platform);
                }
                Err(e) if classify(&e) == ErrorKind::Unsupported => {
                    writeln!(out, "{platform}: {kind}s are not supported")?;
                    summary.unsupported.push(platform);
                }
                Err(e) => {
                    writeln!(out, "{platform}: failed: {e:#}")?;
                    summary.failed.push(PlatformFailure::new(platform, &e));
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Lists artifacts on every platform, skipping platforms that do not
    /// support the kind.
    pub fn collect<T, F>(&self, list: F) -> Result<Vec<Located<T>>>
    where
        F: Fn(&dyn PlatformAdapter) -> Result<Vec<T>>,
    {
        let mut found = Vec::new();
        for adapter in &self.adapters {
            let platform = adapter.platform();
            match list(adapter.as_ref()) {
                Ok(items) => found.extend(items.into_iter().map(|item| Located { platform, item })),
                Err(e) if classify(&e) == ErrorKind::Unsupported => {
                    debug!(platform = %platform, "Kind not supported, skipping");
                }
                Err(e) => return Err(e.context(format!("listing on {platform}"))),
            }
        }
        Ok(found)
    }

    /// Fetches one artifact from every platform that has it.
    pub fn find<T, F>(&self, kind: ArtifactKind, name: &str, get: F) -> Result<Vec<Located<T>>>
    where
        F: Fn(&dyn PlatformAdapter) -> Result<T>,
    {
        let mut found = Vec::new();
        for adapter in &self.adapters {
            let platform = adapter.platform();
            match get(adapter.as_ref()) {
                Ok(item) => found.push(Located { platform, item }),
                Err(e) if matches!(classify(&e), ErrorKind::NotFound | ErrorKind::Unsupported) => {}
                Err(e) => return Err(e),
            }
        }
        if found.is_empty() {
            let searched: Vec<&str> = self.adapters.iter().map(|a| a.platform().as_str()).collect();
            return Err(AixError::not_found(
                format!("{kind} '{name}'"),
                format!("any platform ({})", searched.join(", ")),
            )
            .into());
        }
        Ok(found)
    }
}

fn options(params: InstallParams) -> ValidateOptions {
    ValidateOptions {
        strict: params.strict,
    }
}

fn report_issues(issues: &[ValidationIssue], out: &mut dyn Write) -> Result<()> {
    for issue in issues {
        writeln!(out, "warning: {issue}")?;
    }
    Ok(())
}

fn remove_if_present(exists: Result<bool>, uninstall: impl FnOnce() -> Result<()>) -> Result<bool> {
    if !exists? {
        return Ok(false);
    }
    uninstall()?;
    Ok(true)
}

fn found_or_missing(outcome: Result<()>) -> Result<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(e) if classify(&e) == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// True when `adapter` has an MCP server called `name`.
pub fn mcp_exists(adapter: &dyn PlatformAdapter, name: &str) -> Result<bool> {
    found_or_missing(adapter.get_mcp(name).map(|_| ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MockPlatformAdapter;
    use aix_validate::SkillMeta;
    use anyhow::anyhow;

    fn skill() -> Skill {
        Skill {
            meta: SkillMeta {
                name: "reviewer".into(),
                description: "Reviews code".into(),
                ..Default::default()
            },
            body: "Be careful.".into(),
            source_dir: None,
        }
    }

    fn mock(platform: Platform) -> MockPlatformAdapter {
        let mut m = MockPlatformAdapter::new();
        m.expect_platform().return_const(platform);
        m
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn partial_failure_still_succeeds() {
        let mut ok = mock(Platform::Claude);
        ok.expect_exists_skill().returning(|_| Ok(false));
        ok.expect_install_skill().returning(|_| {
            Ok(WriteReport {
                written: 1,
                ..Default::default()
            })
        });
        let mut bad = mock(Platform::OpenCode);
        bad.expect_exists_skill().returning(|_| Ok(false));
        bad.expect_install_skill()
            .returning(|_| Err(anyhow!("disk full")));

        let orch = Orchestrator::new(vec![Box::new(ok), Box::new(bad)]);
        let mut out = Vec::new();
        let summary = orch
            .install_skill(&skill(), InstallParams::default(), &mut out)
            .unwrap();

        assert_eq!(summary.installed, vec![Platform::Claude]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].platform, Platform::OpenCode);
        let text = output(out);
        assert!(text.contains("claude: installed skill 'reviewer'"));
        assert!(text.contains("opencode: failed: disk full"));
    }

    #[test]
    fn every_platform_failing_is_an_error() {
        let mut a = mock(Platform::Claude);
        a.expect_exists_skill().returning(|_| Ok(false));
        a.expect_install_skill()
            .returning(|_| Err(AixError::unsupported("claude", "x").into()));
        let mut b = mock(Platform::Codex);
        b.expect_exists_skill().returning(|_| Ok(false));
        b.expect_install_skill().returning(|_| Err(anyhow!("boom")));

        let orch = Orchestrator::new(vec![Box::new(a), Box::new(b)]);
        let err = orch
            .install_skill(&skill(), InstallParams::default(), &mut Vec::new())
            .unwrap_err();
        assert!(err.to_string().contains("failed on every platform (claude, codex)"));
        assert_eq!(classify(&err), ErrorKind::Unsupported);
    }

    #[test]
    fn existing_artifact_conflicts_without_force() {
        let mut a = mock(Platform::Claude);
        a.expect_exists_skill().returning(|_| Ok(true));
        a.expect_install_skill().never();

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let err = orch
            .install_skill(&skill(), InstallParams::default(), &mut Vec::new())
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Conflict);
    }

    #[test]
    fn failed_existence_check_is_reported() {
        let mut a = mock(Platform::OpenCode);
        a.expect_exists_skill()
            .returning(|_| Err(AixError::parse("/home/u/.config/opencode/skill", "bad entry").into()));
        a.expect_install_skill().never();

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let mut out = Vec::new();
        let err = orch
            .install_skill(&skill(), InstallParams::default(), &mut out)
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Parse);
        assert!(output(out).contains("opencode: failed: parsing"));
    }

    #[test]
    fn force_skips_existence_check() {
        let mut a = mock(Platform::Claude);
        a.expect_exists_skill().never();
        a.expect_install_skill().times(1).returning(|_| {
            Ok(WriteReport {
                written: 1,
                ..Default::default()
            })
        });

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let params = InstallParams {
            force: true,
            ..Default::default()
        };
        let summary = orch.install_skill(&skill(), params, &mut Vec::new()).unwrap();
        assert_eq!(summary.installed, vec![Platform::Claude]);
    }

    #[test]
    fn invalid_skill_never_reaches_adapters() {
        let mut a = mock(Platform::Claude);
        a.expect_install_skill().never();
        a.expect_exists_skill().never();

        let mut bad = skill();
        bad.meta.name = "Not Valid".into();
        let orch = Orchestrator::new(vec![Box::new(a)]);
        let err = orch
            .install_skill(&bad, InstallParams::default(), &mut Vec::new())
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Validation);
    }

    #[test]
    fn warnings_are_written_per_platform() {
        let mut a = mock(Platform::OpenCode);
        a.expect_exists_skill().returning(|_| Ok(false));
        a.expect_install_skill().returning(|_| {
            let mut report = WriteReport::new();
            report.written = 1;
            report.drop_field(Platform::OpenCode, "skill 'reviewer'", "allowed-tools");
            Ok(report)
        });

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let mut out = Vec::new();
        let summary = orch
            .install_skill(&skill(), InstallParams::default(), &mut out)
            .unwrap();
        assert_eq!(summary.warnings.len(), 1);
        assert!(output(out).contains("warning: opencode: field 'allowed-tools'"));
    }

    #[test]
    fn remove_reports_missing_platforms() {
        let mut a = mock(Platform::Claude);
        a.expect_remove_mcp().returning(|_| Ok(true));
        let mut b = mock(Platform::OpenCode);
        b.expect_remove_mcp().returning(|_| Ok(false));

        let orch = Orchestrator::new(vec![Box::new(a), Box::new(b)]);
        let mut out = Vec::new();
        let summary = orch.remove(ArtifactKind::Mcp, "github", &mut out).unwrap();
        assert_eq!(summary.applied, vec![Platform::Claude]);
        assert_eq!(summary.not_found, vec![Platform::OpenCode]);
        assert!(output(out).contains("mcp server 'github' not found on opencode"));
        summary.require_found(ArtifactKind::Mcp, "github").unwrap();
    }

    #[test]
    fn remove_returns_first_failure_after_reporting_all() {
        let mut a = mock(Platform::Claude);
        a.expect_exists_command().returning(|_| Ok(true));
        a.expect_uninstall_command().returning(|_| Err(anyhow!("locked")));
        let mut b = mock(Platform::Codex);
        b.expect_exists_command().returning(|_| Ok(true));
        b.expect_uninstall_command().times(1).returning(|_| Ok(()));

        let orch = Orchestrator::new(vec![Box::new(a), Box::new(b)]);
        let mut out = Vec::new();
        let err = orch.remove(ArtifactKind::Command, "fix", &mut out).unwrap_err();
        assert_eq!(err.to_string(), "locked");
        assert!(output(out).contains("codex: removed command 'fix'"));
    }

    #[test]
    fn remove_skips_unsupported_platforms() {
        let mut a = mock(Platform::Gemini);
        a.expect_exists_agent()
            .returning(|_| Err(AixError::unsupported("gemini", "managing agents").into()));

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let summary = orch.remove(ArtifactKind::Agent, "planner", &mut Vec::new()).unwrap();
        assert_eq!(summary.unsupported, vec![Platform::Gemini]);
        let err = summary.require_found(ArtifactKind::Agent, "planner").unwrap_err();
        assert_eq!(classify(&err), ErrorKind::NotFound);
    }

    #[test]
    fn disable_missing_everywhere_is_not_found() {
        let mut a = mock(Platform::Claude);
        a.expect_disable_mcp()
            .returning(|name| Err(AixError::not_found(format!("mcp server '{name}'"), "claude").into()));

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let summary = orch.disable_mcp("ghost", &mut Vec::new()).unwrap();
        assert!(summary.require_found(ArtifactKind::Mcp, "ghost").is_err());
    }

    #[test]
    fn find_fails_when_no_platform_has_it() {
        let mut a = mock(Platform::Claude);
        a.expect_get_mcp()
            .returning(|name| Err(AixError::not_found(format!("mcp server '{name}'"), "claude").into()));

        let orch = Orchestrator::new(vec![Box::new(a)]);
        let err = orch
            .find(ArtifactKind::Mcp, "ghost", |a| a.get_mcp("ghost"))
            .unwrap_err();
        assert_eq!(err.to_string(), "mcp server 'ghost' not found in any platform (claude)");
    }

    #[test]
    fn resolve_prefers_explicit_then_config_then_present() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::with_home(tmp.path());
        let config = ToolConfig {
            default_platforms: vec![Platform::Gemini],
            ..Default::default()
        };

        let explicit = [Platform::Codex, Platform::Claude, Platform::Codex];
        assert_eq!(
            resolve_platforms(&explicit, &config, &paths).unwrap(),
            vec![Platform::Codex, Platform::Claude]
        );
        assert_eq!(
            resolve_platforms(&[], &config, &paths).unwrap(),
            vec![Platform::Gemini]
        );

        let empty = ToolConfig::default();
        let err = resolve_platforms(&[], &empty, &paths).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        std::fs::create_dir_all(tmp.path().join(".codex")).unwrap();
        assert_eq!(
            resolve_platforms(&[], &empty, &paths).unwrap(),
            vec![Platform::Codex]
        );
    }
}
