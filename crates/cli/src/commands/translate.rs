use aix_platform::{adapter_for, translate};
use aix_state::{ArtifactKind, Platform};
use anyhow::Result;
use std::io::Write;

use crate::app::{print_json, Context};

/// Handle `aix translate`.
pub(crate) fn handle_translate_command(
    ctx: &Context,
    kind: ArtifactKind,
    name: &str,
    from: Platform,
    to: Platform,
    force: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let source = adapter_for(from, ctx.paths);
    let target = adapter_for(to, ctx.paths);
    let report = translate(kind, name, source.as_ref(), target.as_ref(), force)?;

    if ctx.json {
        return print_json(out, &report);
    }
    for warning in &report.warnings {
        writeln!(out, "warning: {to}: {warning}")?;
    }
    if report.is_unchanged() {
        writeln!(out, "{to}: {kind} '{name}' is up to date")?;
    } else {
        writeln!(out, "Copied {kind} '{name}' from {from} to {to}")?;
    }
    Ok(())
}
