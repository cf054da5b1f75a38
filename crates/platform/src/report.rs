//! What an install or add wrote, and what it had to leave out.

use aix_state::Platform;
use serde::Serialize;
use tracing::warn;

/// Reasons part of an artifact was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum SkipReason {
    /// Field exists in the canonical form but the target cannot store it
    UnsupportedField {
        item: String,
        field: String,
        target: Platform,
    },
    /// Target already holds identical content
    Unchanged { item: String },
}

impl SkipReason {
    /// Returns a human-readable description of the skip reason.
    pub fn description(&self) -> String {
        match self {
            Self::UnsupportedField { item, field, target } => {
                format!("field '{}' of {} is not supported on {}, dropped", field, item, target)
            }
            Self::Unchanged { item } => format!("{} unchanged (same hash)", item),
        }
    }

    /// Returns actionable guidance for the user.
    pub fn guidance(&self) -> Option<&str> {
        match self {
            Self::UnsupportedField { .. } => {
                Some("Edit the installed file by hand if the target has an equivalent setting")
            }
            Self::Unchanged { .. } => None,
        }
    }
}

/// Report for one adapter write.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteReport {
    /// Number of files written
    pub written: usize,
    /// Parts that were skipped with reasons
    pub skipped: Vec<SkipReason>,
    /// Non-fatal warnings, one line each
    pub warnings: Vec<String>,
}

impl WriteReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a field that the target platform cannot represent.
    pub fn drop_field(&mut self, target: Platform, item: &str, field: &str) {
        warn!(platform = %target, item, field, "Dropping unsupported field");
        let reason = SkipReason::UnsupportedField {
            item: item.to_string(),
            field: field.to_string(),
            target,
        };
        self.warnings.push(reason.description());
        self.skipped.push(reason);
    }

    /// Records that the target already matched.
    pub fn unchanged(&mut self, item: &str) {
        self.skipped.push(SkipReason::Unchanged {
            item: item.to_string(),
        });
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Names of the fields dropped for lack of support.
    pub fn dropped_fields(&self) -> Vec<&str> {
        self.skipped
            .iter()
            .filter_map(|s| match s {
                SkipReason::UnsupportedField { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn is_unchanged(&self) -> bool {
        self.written == 0 && self.skipped.iter().any(|s| matches!(s, SkipReason::Unchanged { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_field_records_reason_and_warning() {
        let mut report = WriteReport::new();
        report.drop_field(Platform::OpenCode, "skill 'reviewer'", "allowed-tools");
        assert_eq!(report.dropped_fields(), vec!["allowed-tools"]);
        assert_eq!(
            report.warnings,
            vec!["field 'allowed-tools' of skill 'reviewer' is not supported on opencode, dropped"]
        );
        assert!(report.skipped[0].guidance().is_some());
    }

    #[test]
    fn unchanged_only_when_nothing_written() {
        let mut report = WriteReport::new();
        report.unchanged("skill 'x'");
        assert!(report.is_unchanged());
        report.written = 1;
        assert!(!report.is_unchanged());
    }
}
