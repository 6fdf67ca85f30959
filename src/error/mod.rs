//! Error handling module for adcut

use thiserror::Error;

use crate::domain::errors::{DomainError, ErrorKind};

/// Main error type for adcut operations
#[derive(Error, Debug)]
pub enum AdcutError {
    /// Rejected by the editing model or a collaborator
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Project file not found or inaccessible
    #[error("Project file not found: {path}")]
    ProjectNotFound { path: String },

    /// Invalid time format
    #[error("Invalid time format: {time}. Expected HH:MM:SS.ms, MM:SS.ms, or seconds")]
    InvalidTimeFormat { time: String },
}

impl AdcutError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AdcutError::Domain(err) => match err.kind() {
                ErrorKind::Validation => 2,
                ErrorKind::Conflict => 3,
                ErrorKind::State => 4,
                ErrorKind::CollaboratorFailure => 5,
                ErrorKind::Internal => 70,
            },
            AdcutError::ProjectNotFound { .. } | AdcutError::InvalidTimeFormat { .. } => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_their_message() {
        let err: AdcutError = DomainError::NoMediaLoaded.into();
        assert_eq!(err.to_string(), "No media loaded");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let conflict: AdcutError = DomainError::OverlapNotAllowed {
            track: "video".to_string(),
            conflicting: "x".to_string(),
        }
        .into();
        assert_eq!(conflict.exit_code(), 3);

        let storage: AdcutError =
            DomainError::StorageFailed("Invalid project YAML".to_string()).into();
        assert_eq!(storage.exit_code(), 5);

        let time = AdcutError::InvalidTimeFormat {
            time: "soon".to_string(),
        };
        assert_eq!(time.exit_code(), 2);
    }
}
