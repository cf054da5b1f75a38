//! Validation result types shared by the skill, agent, and command validators.

use aix_state::AixError;
use serde::Serialize;
use std::fmt;

/// A single problem with one field of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Frontmatter field the issue is about (`name`, `description`, ...).
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Offending value, if there is one worth showing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(v) = &self.value {
            write!(f, " (got {v:?})")?;
        }
        Ok(())
    }
}

/// Options shared by all validators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Escalate soft problems to errors and check `allowed-tools` syntax.
    pub strict: bool,
}

impl ValidateOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Errors and warnings found in one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Records `issue` as an error in strict mode and a warning otherwise.
    pub fn strict_error(&mut self, strict: bool, issue: ValidationIssue) {
        if strict {
            self.error(issue);
        } else {
            self.warning(issue);
        }
    }

    /// Returns true if there are any error-level issues.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Converts errors into an [`AixError::Validation`] for `subject`.
    pub fn into_result(self, subject: impl Into<String>) -> Result<Vec<ValidationIssue>, AixError> {
        if self.has_errors() {
            return Err(AixError::Validation {
                subject: subject.into(),
                issues: self.errors.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(self.warnings)
    }
}
