//! `aix mcp ...` handlers.

use aix_platform::{mcp_divergence, InstallParams, McpServer, McpTransport};
use aix_state::{AixError, ArtifactKind, Platform};
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::app::{print_json, Context};
use crate::cli::{McpAction, TransportArg};

/// Handle `aix mcp ...`.
pub(crate) fn handle_mcp_command(ctx: &Context, action: McpAction, out: &mut dyn Write) -> Result<()> {
    match action {
        McpAction::Add {
            name,
            url,
            transport,
            env,
            headers,
            os,
            disabled,
            force,
            command,
        } => {
            let mut command = command.into_iter();
            let server = McpServer {
                transport: transport.map(|t| match t {
                    TransportArg::Stdio => McpTransport::Stdio,
                    TransportArg::Sse => McpTransport::Sse,
                }),
                command: command.next(),
                args: command.collect(),
                url,
                env: parse_pairs("env", &env)?,
                headers: parse_pairs("header", &headers)?,
                disabled,
                platforms: os,
                name,
            };
            add(ctx, &server, force, out)
        }
        McpAction::Remove { name } => apply(ctx, &name, Toggle::Remove, out),
        McpAction::Enable { name } => apply(ctx, &name, Toggle::Enable, out),
        McpAction::Disable { name } => apply(ctx, &name, Toggle::Disable, out),
        McpAction::List => list(ctx, out),
        McpAction::Show { name } => show(ctx, &name, out),
        McpAction::Divergence { name } => divergence(ctx, &name, out),
    }
}

/// Parses repeated `KEY=VALUE` flags.
fn parse_pairs(flag: &str, raw: &[String]) -> Result<BTreeMap<String, String>, AixError> {
    let mut pairs = BTreeMap::new();
    for item in raw {
        match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                pairs.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(AixError::Validation {
                    subject: format!("--{flag} value"),
                    issues: vec![format!("expected KEY=VALUE, got {item:?}")],
                })
            }
        }
    }
    Ok(pairs)
}

fn add(ctx: &Context, server: &McpServer, force: bool, out: &mut dyn Write) -> Result<()> {
    let orch = ctx.orchestrator()?;
    let params = InstallParams {
        force,
        ..Default::default()
    };
    let mut stderr = io::stderr();
    let progress: &mut dyn Write = if ctx.json { &mut stderr } else { &mut *out };
    let summary = orch.add_mcp(server, params, progress)?;
    if ctx.json {
        print_json(out, &summary)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Toggle {
    Remove,
    Enable,
    Disable,
}

fn apply(ctx: &Context, name: &str, toggle: Toggle, out: &mut dyn Write) -> Result<()> {
    let orch = ctx.orchestrator()?;
    let mut stderr = io::stderr();
    let progress: &mut dyn Write = if ctx.json { &mut stderr } else { &mut *out };
    let summary = match toggle {
        Toggle::Remove => orch.remove(ArtifactKind::Mcp, name, progress)?,
        Toggle::Enable => orch.enable_mcp(name, progress)?,
        Toggle::Disable => orch.disable_mcp(name, progress)?,
    };
    summary.require_found(ArtifactKind::Mcp, name)?;
    if ctx.json {
        print_json(out, &summary)?;
    }
    Ok(())
}

fn list(ctx: &Context, out: &mut dyn Write) -> Result<()> {
    let items = ctx.orchestrator()?.collect(|a| a.list_mcp())?;
    if ctx.json {
        return print_json(out, &items);
    }
    if items.is_empty() {
        writeln!(out, "No mcp servers configured.")?;
        return Ok(());
    }
    for located in &items {
        let info = &located.item;
        writeln!(
            out,
            "{:<10} {:<24} {:<6} {}{}",
            located.platform.as_str(),
            info.name,
            info.transport.as_str(),
            info.target,
            if info.disabled { " (disabled)" } else { "" }
        )?;
    }
    Ok(())
}

fn show(ctx: &Context, name: &str, out: &mut dyn Write) -> Result<()> {
    let found = ctx
        .orchestrator()?
        .find(ArtifactKind::Mcp, name, |a| a.get_mcp(name))?;
    if ctx.json {
        return print_json(out, &found);
    }
    for located in &found {
        let server = &located.item;
        writeln!(out, "# {}", located.platform.display_name())?;
        if let Ok(transport) = server.resolved_transport() {
            writeln!(out, "transport: {transport}")?;
        }
        writeln!(out, "target:    {}", server.target())?;
        if !server.env.is_empty() {
            let keys: Vec<&str> = server.env.keys().map(String::as_str).collect();
            writeln!(out, "env:       {}", keys.join(", "))?;
        }
        if !server.headers.is_empty() {
            let keys: Vec<&str> = server.headers.keys().map(String::as_str).collect();
            writeln!(out, "headers:   {}", keys.join(", "))?;
        }
        if !server.platforms.is_empty() {
            writeln!(out, "os:        {}", server.platforms.join(", "))?;
        }
        writeln!(out, "enabled:   {}", !server.disabled)?;
    }
    Ok(())
}

fn divergence(ctx: &Context, name: &str, out: &mut dyn Write) -> Result<()> {
    let orch = ctx.orchestrator()?;
    let report = mcp_divergence(name, orch.adapters())?;
    if ctx.json {
        return print_json(out, &report);
    }

    if report.is_consistent() {
        writeln!(
            out,
            "mcp server '{name}' is identical on {}",
            names(&report.present)
        )?;
    } else {
        writeln!(
            out,
            "mcp server '{name}' differs in: {}",
            report.differing_fields.join(", ")
        )?;
        for (i, group) in report.groups.iter().enumerate() {
            writeln!(out, "  variant {}: {}", i + 1, names(group))?;
        }
    }
    if !report.missing.is_empty() {
        writeln!(out, "missing on: {}", names(&report.missing))?;
    }
    Ok(())
}

fn names(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
