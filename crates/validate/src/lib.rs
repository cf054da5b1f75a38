//! Canonical artifacts for aix and the rules they must satisfy.
//!
//! This crate owns the Markdown-with-frontmatter codec, the platform-agnostic
//! Skill/Agent/Command types and their loaders, the naming grammar, and the
//! three validators.
//!
//! # Example
//!
//! ```rust
//! use aix_validate::{frontmatter, validate_skill, Skill, SkillMeta, ValidateOptions};
//!
//! let content = "---\nname: my-skill\ndescription: A helpful skill\n---\n# My Skill\n";
//! let (meta, body): (SkillMeta, String) = frontmatter::parse(content).unwrap();
//! let skill = Skill { meta, body, source_dir: None };
//!
//! let result = validate_skill(&skill, ValidateOptions::default());
//! assert!(!result.has_errors());
//! ```

pub mod agent;
pub mod command;
pub mod common;
pub mod frontmatter;
pub mod model;
pub mod name;
pub mod scaffold;
pub mod skill;

pub use agent::validate_agent;
pub use command::validate_command;
pub use common::{ValidateOptions, ValidationIssue, ValidationResult};
pub use frontmatter::FrontmatterError;
pub use model::{
    load_agent, load_command, load_skill, Agent, AgentMeta, Command, CommandMeta, Compatibility,
    Skill, SkillMeta, COMMAND_FILE, SKILL_FILE, SKILL_SUBDIRS,
};
pub use name::{is_valid_name, name_problem, MAX_NAME_LENGTH};
pub use scaffold::{init_agent, init_command, init_skill};
pub use skill::validate_skill;

use aix_state::AixError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of validating one skill found under a directory tree.
#[derive(Debug)]
pub struct SkillReport {
    pub path: PathBuf,
    pub outcome: Result<ValidationResult, AixError>,
}

/// Validates every `SKILL.md` under `dir`.
///
/// Parse failures are reported per skill rather than aborting the walk.
pub fn validate_all(dir: &Path, opts: ValidateOptions) -> Vec<SkillReport> {
    let mut reports = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || entry.file_name() != SKILL_FILE {
            continue;
        }
        let outcome = load_skill(path).map(|skill| validate_skill(&skill, opts));
        reports.push(SkillReport {
            path: path.to_path_buf(),
            outcome,
        });
    }
    tracing::debug!(dir = %dir.display(), count = reports.len(), "Validated skill tree");
    reports
}

/// Totals over a batch of validation reports.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub parse_failures: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationSummary {
    pub fn from_reports(reports: &[SkillReport]) -> Self {
        let mut summary = ValidationSummary {
            total: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match &report.outcome {
                Ok(result) => {
                    if !result.has_errors() {
                        summary.valid += 1;
                    }
                    summary.error_count += result.error_count();
                    summary.warning_count += result.warning_count();
                }
                Err(_) => summary.parse_failures += 1,
            }
        }
        summary
    }
}
