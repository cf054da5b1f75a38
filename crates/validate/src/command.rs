//! Slash command validation.

use crate::common::{ValidateOptions, ValidationIssue, ValidationResult};
use crate::model::Command;
use crate::name::name_problem;
use crate::skill::is_valid_tool_spec;

pub fn validate_command(command: &Command, opts: ValidateOptions) -> ValidationResult {
    let mut result = ValidationResult::new();
    let meta = &command.meta;

    if let Some(problem) = name_problem(&meta.name) {
        result.error(ValidationIssue::new("name", problem).with_value(meta.name.clone()));
    }
    if meta.description.trim().is_empty() {
        result.error(ValidationIssue::new("description", "description is required"));
    }
    if let Some(dir) = &command.source_dir {
        let base = dir.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        if !meta.name.is_empty() && base != meta.name {
            result.error(
                ValidationIssue::new(
                    "name",
                    format!("command directory '{base}' must match the command name"),
                )
                .with_value(meta.name.clone()),
            );
        }
    }
    if command.body.trim().is_empty() {
        result.warning(ValidationIssue::new("body", "command has an empty prompt"));
    }
    if opts.strict {
        for tool in &meta.allowed_tools {
            if !is_valid_tool_spec(tool) {
                result.error(
                    ValidationIssue::new("allowed-tools", "malformed tool entry")
                        .with_value(tool.clone()),
                );
            }
        }
    }

    result
}
