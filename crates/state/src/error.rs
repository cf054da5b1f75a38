//! Error taxonomy shared across the aix crates.
//!
//! Lower layers return [`AixError`] directly; the adapter layer wraps it in
//! `anyhow::Error` and the command surface recovers the [`ErrorKind`] by
//! downcasting.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Machine-stable classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Parse,
    NotFound,
    Conflict,
    Integrity,
    Io,
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Parse => "parse",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Integrity => "integrity",
            ErrorKind::Io => "io",
            ErrorKind::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Error)]
pub enum AixError {
    #[error("validation failed for {subject}: {}", issues.join("; "))]
    Validation { subject: String, issues: Vec<String> },

    #[error("parsing {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{what} not found in {scope}")]
    NotFound { what: String, scope: String },

    #[error("{what} already exists in {scope} (use --force to overwrite)")]
    Conflict { what: String, scope: String },

    #[error("backup corrupted: {}: expected sha256 {expected}, got {actual}", path.display())]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation} is not supported on {platform}")]
    Unsupported { platform: String, operation: String },

    #[error("marshaling {format}: {message}")]
    Marshal {
        format: &'static str,
        message: String,
    },
}

impl AixError {
    pub fn io(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        AixError::Io {
            op,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        AixError::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>, scope: impl Into<String>) -> Self {
        AixError::NotFound {
            what: what.into(),
            scope: scope.into(),
        }
    }

    pub fn conflict(what: impl Into<String>, scope: impl Into<String>) -> Self {
        AixError::Conflict {
            what: what.into(),
            scope: scope.into(),
        }
    }

    pub fn unsupported(platform: impl Into<String>, operation: impl Into<String>) -> Self {
        AixError::Unsupported {
            platform: platform.into(),
            operation: operation.into(),
        }
    }

    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AixError::Validation { .. } => ErrorKind::Validation,
            AixError::Parse { .. } | AixError::Marshal { .. } => ErrorKind::Parse,
            AixError::NotFound { .. } => ErrorKind::NotFound,
            AixError::Conflict { .. } => ErrorKind::Conflict,
            AixError::Integrity { .. } => ErrorKind::Integrity,
            AixError::Io { .. } => ErrorKind::Io,
            AixError::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }
}

/// Returns the kind of the first [`AixError`] found in an error chain.
///
/// Errors that carry no aix classification are reported as [`ErrorKind::Io`].
pub fn classify(err: &anyhow::Error) -> ErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AixError>().map(AixError::kind))
        .unwrap_or(ErrorKind::Io)
}

/// JSON projection of an error for `--json` callers.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_the_file() {
        let err = AixError::parse("/home/u/.claude.json", "expected value at line 1 column 1");
        assert_eq!(
            err.to_string(),
            "parsing /home/u/.claude.json: expected value at line 1 column 1"
        );
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn io_error_wraps_operation_and_path() {
        let source = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let err = AixError::io("creating temp file", "/ro/dir", source);
        let msg = err.to_string();
        assert!(msg.starts_with("creating temp file /ro/dir"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn classify_walks_anyhow_context() {
        let err = anyhow::Error::from(AixError::not_found("skill 'x'", "claude"))
            .context("removing skill");
        assert_eq!(classify(&err), ErrorKind::NotFound);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(classify(&plain), ErrorKind::Io);
    }

    #[test]
    fn validation_message_joins_issues() {
        let err = AixError::Validation {
            subject: "skill 'Bad'".into(),
            issues: vec!["name: invalid".into(), "description: required".into()],
        };
        assert_eq!(
            err.to_string(),
            "validation failed for skill 'Bad': name: invalid; description: required"
        );
    }

    #[test]
    fn kinds_have_stable_tags() {
        let report = ErrorReport::new(ErrorKind::NotFound, "gone");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(ErrorKind::Integrity.as_str(), "integrity");
    }
}
