//! Skill validation.

use aix_state::is_valid_platform;
use regex::Regex;
use std::sync::LazyLock;

use crate::common::{ValidateOptions, ValidationIssue, ValidationResult};
use crate::model::Skill;
use crate::name::name_problem;

// `Read`, `Bash(git:*)`, `mcp__github__search`
static TOOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\([^()]*\))?$").expect("valid regex"));

/// Returns true if `tool` is a well-formed `allowed-tools` entry.
pub fn is_valid_tool_spec(tool: &str) -> bool {
    TOOL_REGEX.is_match(tool)
}

/// Validates a skill's metadata and its on-disk location.
pub fn validate_skill(skill: &Skill, opts: ValidateOptions) -> ValidationResult {
    let mut result = ValidationResult::new();
    let meta = &skill.meta;

    if let Some(problem) = name_problem(&meta.name) {
        let issue = ValidationIssue::new("name", problem);
        result.error(if meta.name.is_empty() {
            issue
        } else {
            issue.with_value(meta.name.clone())
        });
    }

    if meta.description.trim().is_empty() {
        result.strict_error(
            opts.strict,
            ValidationIssue::new("description", "description is required"),
        );
    }

    if let Some(dir) = &skill.source_dir {
        let base = dir.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        if !meta.name.is_empty() && base != meta.name {
            result.error(
                ValidationIssue::new(
                    "name",
                    format!("skill directory '{base}' must match the skill name"),
                )
                .with_value(meta.name.clone()),
            );
        }
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

    if let Some(compat) = &meta.compatibility {
        for platform in compat.platforms() {
            if !is_valid_platform(platform) {
                result.warning(
                    ValidationIssue::new("compatibility", "unknown platform")
                        .with_value(platform.to_string()),
                );
            }
        }
    }

    if let Some(version) = meta.version() {
        if semver::Version::parse(&version).is_err() {
            result.warning(
                ValidationIssue::new("metadata.version", "version is not valid semver")
                    .with_value(version),
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Compatibility, SkillMeta};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn skill(name: &str, description: &str) -> Skill {
        Skill {
            meta: SkillMeta {
                name: name.into(),
                description: description.into(),
                ..Default::default()
            },
            body: "Body".into(),
            source_dir: Some(PathBuf::from(format!("/src/{name}"))),
        }
    }

    #[test]
    fn valid_skill_is_clean() {
        let r = validate_skill(&skill("reviewer", "Reviews code"), ValidateOptions::default());
        assert!(!r.has_errors());
        assert_eq!(r.warning_count(), 0);
    }

    #[test]
    fn missing_description_depends_on_strictness() {
        let s = skill("reviewer", "");
        let lax = validate_skill(&s, ValidateOptions::default());
        assert!(!lax.has_errors());
        assert_eq!(lax.warnings[0].field, "description");

        let strict = validate_skill(&s, ValidateOptions::strict());
        assert!(strict.has_errors());
        assert_eq!(strict.errors[0].field, "description");
    }

    #[test]
    fn bad_name_is_an_error() {
        let mut s = skill("reviewer", "d");
        s.meta.name = "Reviewer".into();
        s.source_dir = Some(PathBuf::from("/src/Reviewer"));
        let r = validate_skill(&s, ValidateOptions::default());
        assert!(r.has_errors());
        assert_eq!(r.errors[0].value.as_deref(), Some("Reviewer"));
    }

    #[test]
    fn directory_must_match_name() {
        let mut s = skill("reviewer", "d");
        s.source_dir = Some(PathBuf::from("/src/review"));
        let r = validate_skill(&s, ValidateOptions::default());
        assert!(r.has_errors());
        assert!(r.errors[0].message.contains("'review'"));
    }

    #[test]
    fn tool_syntax_checked_only_when_strict() {
        let mut s = skill("reviewer", "d");
        s.meta.allowed_tools = vec!["Read".into(), "Bash(git:*)".into(), "bad tool".into()];
        assert!(!validate_skill(&s, ValidateOptions::default()).has_errors());

        let strict = validate_skill(&s, ValidateOptions::strict());
        assert_eq!(strict.error_count(), 1);
        assert_eq!(strict.errors[0].value.as_deref(), Some("bad tool"));
    }

    #[test]
    fn unknown_compatibility_and_bad_version_warn() {
        let mut s = skill("reviewer", "d");
        s.meta.compatibility = Some(Compatibility::List(vec!["claude".into(), "cursor".into()]));
        let mut md = BTreeMap::new();
        md.insert("version".to_string(), serde_yaml::Value::String("one".into()));
        s.meta.metadata = md;

        let r = validate_skill(&s, ValidateOptions::default());
        assert!(!r.has_errors());
        assert_eq!(r.warning_count(), 2);
    }
}
