use aix_backup::classify;
use aix_platform::{resolve_platforms, Orchestrator};
use aix_state::{env_debug, load_config, ErrorReport, Paths, Platform};
use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands;

/// Per-invocation settings shared by every handler.
pub(crate) struct Context<'a> {
    pub paths: &'a Paths,
    pub json: bool,
    explicit: Vec<Platform>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(paths: &'a Paths, json: bool, explicit: Vec<Platform>) -> Self {
        Self {
            paths,
            json,
            explicit,
        }
    }

    /// Platforms this invocation targets.
    pub(crate) fn platforms(&self) -> Result<Vec<Platform>> {
        let config = load_config(self.paths)?;
        Ok(resolve_platforms(&self.explicit, &config, self.paths)?)
    }

    pub(crate) fn orchestrator(&self) -> Result<Orchestrator> {
        Ok(Orchestrator::for_platforms(self.paths, &self.platforms()?))
    }
}

/// Writes `value` as pretty JSON followed by a newline.
pub(crate) fn print_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorReport,
}

fn init_tracing() {
    let default = if env_debug() { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("AIX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// The main entry point for the `aix` binary.
pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    let stdout = io::stdout();
    let result = Paths::from_env().and_then(|paths| execute(cli, &paths, &mut stdout.lock()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json, &mut stdout.lock(), &mut io::stderr());
            ExitCode::FAILURE
        }
    }
}

/// Prints `err` as `error: <message>`, or as a JSON envelope in `--json` mode.
pub(crate) fn report_error(err: &anyhow::Error, json: bool, out: &mut dyn Write, errs: &mut dyn Write) {
    let message = format!("{err:#}");
    let written = if json {
        let envelope = ErrorEnvelope {
            error: ErrorReport::new(classify(err), message.clone()),
        };
        print_json(out, &envelope)
    } else {
        writeln!(errs, "error: {message}").map_err(Into::into)
    };
    if written.is_err() {
        eprintln!("error: {message}");
    }
}

/// Runs one parsed command against `paths`, writing results to `out`.
pub fn execute(cli: Cli, paths: &Paths, out: &mut dyn Write) -> Result<()> {
    let ctx = Context::new(paths, cli.json, cli.platforms);
    match cli.command {
        Commands::Skill { action } => commands::handle_skill_command(&ctx, action, out),
        Commands::Agent { action } => commands::handle_agent_command(&ctx, action, out),
        Commands::SlashCommand { action } => commands::handle_command_command(&ctx, action, out),
        Commands::Mcp { action } => commands::handle_mcp_command(&ctx, action, out),
        Commands::Backup { action } => commands::handle_backup_command(&ctx, action, out),
        Commands::Translate {
            kind,
            name,
            from,
            to,
            force,
        } => commands::handle_translate_command(&ctx, kind.into(), &name, from, to, force, out),
    }
}
