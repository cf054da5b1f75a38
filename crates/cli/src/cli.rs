use aix_state::{ArtifactKind, Platform};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line interface for `aix`.
#[derive(Debug, Parser)]
#[command(
    name = "aix",
    version,
    about = "Manage skills, agents, commands and MCP servers across AI coding assistants"
)]
pub struct Cli {
    /// Target platform (repeatable). Defaults to `default_platforms` from the
    /// config file, then to every platform installed on this machine.
    #[arg(long = "platform", short = 'p', global = true, value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,
    /// Print results and errors as JSON on stdout.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `aix` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manages skills (`<name>/SKILL.md` directories).
    Skill {
        #[command(subcommand)]
        action: ArtifactAction,
    },
    /// Manages agents.
    Agent {
        #[command(subcommand)]
        action: ArtifactAction,
    },
    /// Manages slash commands.
    #[command(name = "command")]
    SlashCommand {
        #[command(subcommand)]
        action: ArtifactAction,
    },
    /// Manages MCP server definitions.
    Mcp {
        #[command(subcommand)]
        action: McpAction,
    },
    /// Manages configuration backups.
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Copies an artifact from one platform to another.
    Translate {
        /// Kind of artifact to copy.
        #[arg(value_enum)]
        kind: KindArg,
        /// Artifact name.
        name: String,
        /// Platform to read from.
        #[arg(long)]
        from: Platform,
        /// Platform to write to.
        #[arg(long)]
        to: Platform,
        /// Overwrite the artifact on the target if it exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

/// Subcommands shared by skills, agents and commands.
#[derive(Debug, Subcommand)]
pub enum ArtifactAction {
    /// Installs from a local path or a git URL (`<url>#<subdir>`).
    Install {
        /// Skill directory, `.md` file, or git URL.
        source: String,
        #[command(flatten)]
        opts: InstallArgs,
    },
    /// Lists installed artifacts on every target platform.
    List,
    /// Prints an installed artifact in canonical form.
    Show {
        name: String,
    },
    /// Removes an artifact from every target platform that has it.
    #[command(alias = "rm")]
    Remove {
        name: String,
    },
    /// Validates a source file or directory without installing it.
    Validate {
        path: PathBuf,
        /// Treat soft problems as errors and check `allowed-tools` syntax.
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Creates a new artifact skeleton.
    Init {
        name: String,
        /// One-line description written into the frontmatter.
        #[arg(long, short = 'd')]
        description: String,
        /// Directory to create it in.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct InstallArgs {
    /// Overwrite an existing artifact with the same name.
    #[arg(long, default_value_t = false)]
    pub force: bool,
    /// Validate in strict mode before installing.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

/// MCP server subcommands.
#[derive(Debug, Subcommand)]
pub enum McpAction {
    /// Adds a server: `aix mcp add github -- npx -y @modelcontextprotocol/server-github`.
    Add {
        name: String,
        /// Remote server URL (sse transport).
        #[arg(long, conflicts_with = "command")]
        url: Option<String>,
        /// Transport; inferred from the command or url when omitted.
        #[arg(long, value_enum)]
        transport: Option<TransportArg>,
        /// Environment variable for stdio servers (`KEY=VALUE`, repeatable).
        #[arg(long = "env", short = 'e', value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// HTTP header for remote servers (`KEY=VALUE`, repeatable).
        #[arg(long = "header", value_name = "KEY=VALUE")]
        headers: Vec<String>,
        /// Restrict the server to these operating systems (darwin, linux, win32).
        #[arg(long = "os", value_name = "OS")]
        os: Vec<String>,
        /// Add the server in a disabled state.
        #[arg(long, default_value_t = false)]
        disabled: bool,
        /// Overwrite an existing server with the same name.
        #[arg(long, default_value_t = false)]
        force: bool,
        /// Command and arguments for stdio servers, after `--`.
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },
    /// Removes a server from every target platform that has it.
    #[command(alias = "rm")]
    Remove {
        name: String,
    },
    /// Lists servers on every target platform.
    List,
    /// Shows one server as stored on each platform.
    Show {
        name: String,
    },
    /// Enables a server.
    Enable {
        name: String,
    },
    /// Disables a server without removing it.
    Disable {
        name: String,
    },
    /// Reports how a server's definition differs between platforms.
    Divergence {
        name: String,
    },
}

/// Backup subcommands.
#[derive(Debug, Subcommand)]
pub enum BackupAction {
    /// Snapshots the target platforms' config files now.
    Create,
    /// Lists backups, newest first.
    List,
    /// Restores a backup by id.
    Restore {
        id: String,
    },
    /// Deletes all but the newest backups.
    Prune {
        /// Backups to keep per platform (defaults to `AIX_BACKUP_RETENTION`, then 5).
        #[arg(long)]
        keep: Option<usize>,
    },
    /// Rehashes a backup's stored files without restoring.
    Verify {
        id: String,
    },
    /// Deletes one backup.
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Skill,
    Agent,
    Command,
    Mcp,
}

impl From<KindArg> for ArtifactKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Skill => ArtifactKind::Skill,
            KindArg::Agent => ArtifactKind::Agent,
            KindArg::Command => ArtifactKind::Command,
            KindArg::Mcp => ArtifactKind::Mcp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Stdio,
    Sse,
}
