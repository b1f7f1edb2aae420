//! Error types and exit codes for vaultcloze
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (I/O, interrupted run)
//! - 2: Usage error (bad flags/args, missing roots)
//! - 3: Data/config error (missing vault, unreadable config)

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Exit codes for the vaultcloze binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/config error - missing vault, invalid config (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Coarse classification of a failure.
///
/// Per-document problems are recorded with one of these kinds instead of
/// aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    IoFailure,
    NotFound,
    MalformedReference,
    InconsistentCount,
    InvalidMarker,
    Usage,
    Config,
    Interrupted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::IoFailure => "io_failure",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MalformedReference => "malformed_reference",
            ErrorKind::InconsistentCount => "inconsistent_count",
            ErrorKind::InvalidMarker => "invalid_marker",
            ErrorKind::Usage => "usage",
            ErrorKind::Config => "config",
            ErrorKind::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during vaultcloze operations
#[derive(Error, Debug)]
pub enum ClozeError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    // Data/config errors (exit code 3)
    #[error("vault not found: {path:?}")]
    VaultNotFound { path: PathBuf },

    #[error("collection not found: {path:?}")]
    CollectionNotFound { path: PathBuf },

    #[error("invalid config in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    // Generic failures (exit code 1)
    #[error("not found: {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to {operation} {path:?}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed block reference {reference}: {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("found {found} cloze markers in source but resolved {expected}")]
    InconsistentCount { expected: usize, found: usize },

    #[error("cloze id {id} is used more than once for {origin}; the repeat moved to {reassigned}")]
    DuplicateMarkerId {
        id: u32,
        origin: String,
        reassigned: u32,
    },

    #[error("cloze id c{digits} is out of range, treated as unassigned")]
    MarkerIdOutOfRange { digits: String },

    #[error("{0}")]
    Other(String),

    #[error("Regeneration interrupted. Run `vaultcloze regen` to resume.")]
    Interrupted,
}

impl ClozeError {
    /// Create an error for a failed IO operation on a path
    pub fn io(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return ClozeError::NotFound {
                path: path.to_path_buf(),
            };
        }
        ClozeError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an error for a block reference that could not be resolved
    pub fn malformed_reference(reference: &str, reason: impl fmt::Display) -> Self {
        ClozeError::MalformedReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means "the key does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClozeError::NotFound { .. })
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClozeError::UsageError(_) => ErrorKind::Usage,
            ClozeError::VaultNotFound { .. } | ClozeError::CollectionNotFound { .. } => {
                ErrorKind::NotFound
            }
            ClozeError::InvalidConfig { .. } | ClozeError::Toml(_) => ErrorKind::Config,
            ClozeError::NotFound { .. } => ErrorKind::NotFound,
            ClozeError::Io { .. } | ClozeError::Json(_) | ClozeError::Other(_) => {
                ErrorKind::IoFailure
            }
            ClozeError::MalformedReference { .. } => ErrorKind::MalformedReference,
            ClozeError::InconsistentCount { .. } => ErrorKind::InconsistentCount,
            ClozeError::DuplicateMarkerId { .. } | ClozeError::MarkerIdOutOfRange { .. } => {
                ErrorKind::InvalidMarker
            }
            ClozeError::Interrupted => ErrorKind::Interrupted,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ClozeError::UsageError(_) => ExitCode::Usage,

            ClozeError::VaultNotFound { .. }
            | ClozeError::CollectionNotFound { .. }
            | ClozeError::InvalidConfig { .. }
            | ClozeError::Toml(_) => ExitCode::Data,

            ClozeError::NotFound { .. }
            | ClozeError::Io { .. }
            | ClozeError::Json(_)
            | ClozeError::MalformedReference { .. }
            | ClozeError::InconsistentCount { .. }
            | ClozeError::DuplicateMarkerId { .. }
            | ClozeError::MarkerIdOutOfRange { .. }
            | ClozeError::Other(_)
            | ClozeError::Interrupted => ExitCode::Failure,
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.kind().to_string(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for vaultcloze operations
pub type Result<T> = std::result::Result<T, ClozeError>;

/// A non-fatal problem recorded while processing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: ErrorKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Issue {
            kind,
            message: message.into(),
        }
    }
}

impl From<&ClozeError> for Issue {
    fn from(err: &ClozeError) -> Self {
        Issue::new(err.kind(), err.to_string())
    }
}

impl From<ClozeError> for Issue {
    fn from(err: ClozeError) -> Self {
        Issue::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = ClozeError::io(
            "read",
            Path::new("/missing.md"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_io_other_maps_to_io_failure() {
        let err = ClozeError::io(
            "write",
            Path::new("/locked.md"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(err.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            ClozeError::UsageError("bad".into()).exit_code(),
            ExitCode::Usage
        );
        assert_eq!(
            ClozeError::VaultNotFound {
                path: PathBuf::from("/v")
            }
            .exit_code(),
            ExitCode::Data
        );
        assert_eq!(ClozeError::Interrupted.exit_code(), ExitCode::Failure);
    }

    #[test]
    fn test_to_json_shape() {
        let json = ClozeError::malformed_reference("![x](a.md#^b)", "hash not found").to_json();
        assert_eq!(json["error"]["code"], 1);
        assert_eq!(json["error"]["type"], "malformed_reference");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("hash not found"));
    }

    #[test]
    fn test_issue_from_error() {
        let issue = Issue::from(ClozeError::InconsistentCount {
            expected: 2,
            found: 3,
        });
        assert_eq!(issue.kind, ErrorKind::InconsistentCount);
        assert!(issue.message.contains('3'));
    }

    #[test]
    fn test_marker_problems_are_invalid_marker_issues() {
        let duplicate = Issue::from(ClozeError::DuplicateMarkerId {
            id: 3,
            origin: "A.md".into(),
            reassigned: 1,
        });
        assert_eq!(duplicate.kind, ErrorKind::InvalidMarker);
        assert!(duplicate.message.contains("moved to 1"));

        let oversized = ClozeError::MarkerIdOutOfRange {
            digits: "99999999999".into(),
        };
        assert_eq!(oversized.kind().to_string(), "invalid_marker");
        assert_eq!(oversized.exit_code(), ExitCode::Failure);
    }
}
