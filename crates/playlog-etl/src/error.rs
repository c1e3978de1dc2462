//! Error types for the extraction pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting and loading an input file.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A line could not be parsed or lacks a required field.
    #[error("malformed record in {} line {line}: {message}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// An input file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory to walk does not exist.
    #[error("input directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Directory traversal failed.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An error propagated from the store.
    #[error("store error: {0}")]
    Store(#[from] playlog_core::Error),
}

impl EtlError {
    /// Returns `true` when the file itself is bad rather than the store.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }

    /// Returns `true` when a store write broke an entity invariant.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_constraint_violation())
    }
}

/// Convenience alias for pipeline results.
pub type EtlResult<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let malformed = EtlError::MalformedRecord {
            path: PathBuf::from("a.json"),
            line: 3,
            message: "missing field `title`".to_string(),
        };
        assert!(malformed.is_malformed());
        assert!(!malformed.is_constraint_violation());
        assert_eq!(
            malformed.to_string(),
            "malformed record in a.json line 3: missing field `title`"
        );

        let violation = EtlError::from(playlog_core::Error::constraint("user", 0));
        assert!(violation.is_constraint_violation());
        assert!(!violation.is_malformed());
    }
}
