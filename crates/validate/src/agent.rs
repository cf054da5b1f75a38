//! Agent validation.

use crate::common::{ValidateOptions, ValidationIssue, ValidationResult};
use crate::model::Agent;
use crate::name::name_problem;

/// Agent modes OpenCode understands.
pub const AGENT_MODES: [&str; 3] = ["primary", "subagent", "all"];

pub fn validate_agent(agent: &Agent, _opts: ValidateOptions) -> ValidationResult {
    let mut result = ValidationResult::new();
    let meta = &agent.meta;

    if let Some(problem) = name_problem(&meta.name) {
        result.error(ValidationIssue::new("name", problem).with_value(meta.name.clone()));
    }
    if meta.description.trim().is_empty() {
        result.error(ValidationIssue::new("description", "description is required"));
    }
    if let Some(t) = meta.temperature {
        if !(0.0..=2.0).contains(&t) {
            result.error(
                ValidationIssue::new("temperature", "temperature must be between 0 and 2")
                    .with_value(t.to_string()),
            );
        }
    }
    if let Some(mode) = &meta.mode {
        if !AGENT_MODES.contains(&mode.as_str()) {
            result.warning(
                ValidationIssue::new("mode", "expected one of primary, subagent, all")
                    .with_value(mode.clone()),
            );
        }
    }

    result
}
