//! `aix skill|agent|command ...` handlers.

use aix_platform::{InstallParams, Located, Orchestrator};
use aix_state::{AixError, ArtifactKind};
use aix_validate::{
    frontmatter, init_agent, init_command, init_skill, load_agent, load_command, load_skill,
    validate_agent, validate_all, validate_command, validate_skill, ValidateOptions,
    ValidationResult, ValidationSummary, SKILL_FILE,
};
use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

use crate::app::{print_json, Context};
use crate::cli::{ArtifactAction, InstallArgs};
use crate::source;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Skill,
    Agent,
    Command,
}

impl Kind {
    fn artifact(self) -> ArtifactKind {
        match self {
            Kind::Skill => ArtifactKind::Skill,
            Kind::Agent => ArtifactKind::Agent,
            Kind::Command => ArtifactKind::Command,
        }
    }
}

/// An artifact as shown by `show --json`.
#[derive(Serialize)]
struct Shown<M: Serialize> {
    platform: aix_state::Platform,
    meta: M,
    body: String,
}

/// Handle `aix skill ...`.
pub(crate) fn handle_skill_command(ctx: &Context, action: ArtifactAction, out: &mut dyn Write) -> Result<()> {
    handle(ctx, Kind::Skill, action, out)
}

/// Handle `aix agent ...`.
pub(crate) fn handle_agent_command(ctx: &Context, action: ArtifactAction, out: &mut dyn Write) -> Result<()> {
    handle(ctx, Kind::Agent, action, out)
}

/// Handle `aix command ...`.
pub(crate) fn handle_command_command(
    ctx: &Context,
    action: ArtifactAction,
    out: &mut dyn Write,
) -> Result<()> {
    handle(ctx, Kind::Command, action, out)
}

fn handle(ctx: &Context, kind: Kind, action: ArtifactAction, out: &mut dyn Write) -> Result<()> {
    match action {
        ArtifactAction::Install { source, opts } => install(ctx, kind, &source, opts, out),
        ArtifactAction::List => list(ctx, kind, out),
        ArtifactAction::Show { name } => show(ctx, kind, &name, out),
        ArtifactAction::Remove { name } => remove(ctx, kind, &name, out),
        ArtifactAction::Validate { path, strict } => validate(ctx, kind, &path, strict, out),
        ArtifactAction::Init {
            name,
            description,
            dir,
        } => init(ctx, kind, &name, &description, &dir, out),
    }
}

fn install(ctx: &Context, kind: Kind, location: &str, opts: InstallArgs, out: &mut dyn Write) -> Result<()> {
    let source = source::resolve(location)?;
    let path = source.path();
    let orch = ctx.orchestrator()?;
    let params = InstallParams {
        force: opts.force,
        strict: opts.strict,
    };

    let mut stderr = io::stderr();
    let progress: &mut dyn Write = if ctx.json { &mut stderr } else { &mut *out };
    let summary = match kind {
        Kind::Skill => orch.install_skill(&load_skill(path)?, params, progress)?,
        Kind::Agent => orch.install_agent(&load_agent(path)?, params, progress)?,
        Kind::Command => orch.install_command(&load_command(path)?, params, progress)?,
    };

    if ctx.json {
        print_json(out, &summary)?;
    }
    Ok(())
}

fn list(ctx: &Context, kind: Kind, out: &mut dyn Write) -> Result<()> {
    let orch = ctx.orchestrator()?;
    match kind {
        Kind::Skill => {
            let items = orch.collect(|a| a.list_skills())?;
            print_rows(ctx, kind, &items, |s| (s.name.clone(), s.description.clone()), out)
        }
        Kind::Agent => {
            let items = orch.collect(|a| a.list_agents())?;
            print_rows(ctx, kind, &items, |s| (s.name.clone(), s.description.clone()), out)
        }
        Kind::Command => {
            let items = orch.collect(|a| a.list_commands())?;
            print_rows(ctx, kind, &items, |s| (s.name.clone(), s.description.clone()), out)
        }
    }
}

fn print_rows<T, F>(
    ctx: &Context,
    kind: Kind,
    items: &[Located<T>],
    row: F,
    out: &mut dyn Write,
) -> Result<()>
where
    T: Serialize,
    F: Fn(&T) -> (String, String),
{
    if ctx.json {
        return print_json(out, items);
    }
    if items.is_empty() {
        writeln!(out, "No {}s installed.", kind.artifact())?;
        return Ok(());
    }
    for located in items {
        let (name, description) = row(&located.item);
        writeln!(
            out,
            "{:<10} {:<28} {}",
            located.platform.as_str(),
            name,
            description
        )?;
    }
    Ok(())
}

fn show(ctx: &Context, kind: Kind, name: &str, out: &mut dyn Write) -> Result<()> {
    let orch = ctx.orchestrator()?;
    let artifact = kind.artifact();
    match kind {
        Kind::Skill => {
            let found = orch.find(artifact, name, |a| a.get_skill(name))?;
            emit(ctx, &found, |s| (s.meta.clone(), s.body.clone()), out)
        }
        Kind::Agent => {
            let found = orch.find(artifact, name, |a| a.get_agent(name))?;
            emit(ctx, &found, |s| (s.meta.clone(), s.body.clone()), out)
        }
        Kind::Command => {
            let found = orch.find(artifact, name, |a| a.get_command(name))?;
            emit(ctx, &found, |s| (s.meta.clone(), s.body.clone()), out)
        }
    }
}

fn emit<T, M, F>(ctx: &Context, found: &[Located<T>], split: F, out: &mut dyn Write) -> Result<()>
where
    M: Serialize,
    F: Fn(&T) -> (M, String),
{
    if ctx.json {
        let shown: Vec<Shown<M>> = found
            .iter()
            .map(|l| {
                let (meta, body) = split(&l.item);
                Shown {
                    platform: l.platform,
                    meta,
                    body,
                }
            })
            .collect();
        return print_json(out, &shown);
    }
    for (i, located) in found.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let (meta, body) = split(&located.item);
        writeln!(out, "# {}", located.platform.display_name())?;
        write!(out, "{}", frontmatter::format(&meta, &body)?)?;
    }
    Ok(())
}

fn remove(ctx: &Context, kind: Kind, name: &str, out: &mut dyn Write) -> Result<()> {
    let orch: Orchestrator = ctx.orchestrator()?;
    let mut stderr = io::stderr();
    let progress: &mut dyn Write = if ctx.json { &mut stderr } else { &mut *out };
    let summary = orch.remove(kind.artifact(), name, progress)?;
    summary.require_found(kind.artifact(), name)?;
    if ctx.json {
        print_json(out, &summary)?;
    }
    Ok(())
}

fn validate(ctx: &Context, kind: Kind, path: &Path, strict: bool, out: &mut dyn Write) -> Result<()> {
    let opts = ValidateOptions { strict };
    if kind == Kind::Skill && path.is_dir() && !path.join(SKILL_FILE).exists() {
        return validate_tree(ctx, path, opts, out);
    }

    let (subject, result): (String, ValidationResult) = match kind {
        Kind::Skill => {
            let skill = load_skill(path)?;
            (format!("skill '{}'", skill.name()), validate_skill(&skill, opts))
        }
        Kind::Agent => {
            let agent = load_agent(path)?;
            (format!("agent '{}'", agent.name()), validate_agent(&agent, opts))
        }
        Kind::Command => {
            let command = load_command(path)?;
            (format!("command '{}'", command.name()), validate_command(&command, opts))
        }
    };

    let warnings = result.clone().into_result(subject.clone())?;
    if ctx.json {
        return print_json(out, &result);
    }
    for warning in &warnings {
        writeln!(out, "warning: {warning}")?;
    }
    writeln!(out, "{subject} is valid")?;
    Ok(())
}

fn validate_tree(ctx: &Context, dir: &Path, opts: ValidateOptions, out: &mut dyn Write) -> Result<()> {
    let reports = validate_all(dir, opts);
    let summary = ValidationSummary::from_reports(&reports);

    let mut failed = Vec::new();
    for report in &reports {
        let shown = report.path.display();
        match &report.outcome {
            Ok(result) => {
                for issue in &result.errors {
                    failed.push(format!("{shown}: {issue}"));
                }
                if !ctx.json {
                    for issue in &result.warnings {
                        writeln!(out, "warning: {shown}: {issue}")?;
                    }
                }
            }
            Err(e) => failed.push(format!("{shown}: {e}")),
        }
    }

    if !failed.is_empty() {
        return Err(AixError::Validation {
            subject: format!(
                "{} of {} skills under {}",
                summary.total - summary.valid,
                summary.total,
                dir.display()
            ),
            issues: failed,
        }
        .into());
    }
    if ctx.json {
        #[derive(Serialize)]
        struct TreeSummary {
            total: usize,
            valid: usize,
            warnings: usize,
        }
        return print_json(
            out,
            &TreeSummary {
                total: summary.total,
                valid: summary.valid,
                warnings: summary.warning_count,
            },
        );
    }
    writeln!(out, "Validated {} skills: all valid", summary.total)?;
    Ok(())
}

fn init(
    ctx: &Context,
    kind: Kind,
    name: &str,
    description: &str,
    dir: &Path,
    out: &mut dyn Write,
) -> Result<()> {
    let created = match kind {
        Kind::Skill => init_skill(dir, name, description)?,
        Kind::Agent => init_agent(dir, name, description)?,
        Kind::Command => init_command(dir, name, description)?,
    };
    if ctx.json {
        return print_json(out, &serde_json::json!({ "path": created }));
    }
    writeln!(out, "Created {}", created.display())?;
    Ok(())
}
