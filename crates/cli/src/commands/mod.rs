//! CLI command handlers for the aix application.

mod artifact;
mod backup;
mod mcp;
mod translate;

pub(crate) use artifact::{handle_agent_command, handle_command_command, handle_skill_command};
pub(crate) use backup::handle_backup_command;
pub(crate) use mcp::handle_mcp_command;
pub(crate) use translate::handle_translate_command;
