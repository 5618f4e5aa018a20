//! Unified upload error
//!
//! One enum for the three failure families an upload action can hit:
//! validation (user picked a bad file), storage (backend failure) and session
//! state (programming-usage fault).

use quill_core::{ErrorMetadata, LogLevel, SessionStateError, ValidationError};

use crate::traits::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session state error: {0}")]
    SessionState(#[from] SessionStateError),
}

impl UploadError {
    pub fn is_validation(&self) -> bool {
        matches!(self, UploadError::Validation(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, UploadError::Storage(_))
    }

    pub fn is_session_state(&self) -> bool {
        matches!(self, UploadError::SessionState(_))
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            UploadError::Validation(ValidationError::FileTooLarge { .. }) => "PAYLOAD_TOO_LARGE",
            UploadError::Validation(_) => "VALIDATION_ERROR",
            UploadError::Storage(StorageError::NotFound { .. }) => "NOT_FOUND",
            UploadError::Storage(_) => "STORAGE_ERROR",
            UploadError::SessionState(_) => "SESSION_STATE_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            UploadError::Validation(_) => true,
            UploadError::Storage(StorageError::InvalidKey(_))
            | UploadError::Storage(StorageError::ConfigError(_))
            | UploadError::Storage(StorageError::BucketNotFound(_))
            | UploadError::Storage(StorageError::Unsupported { .. }) => false,
            UploadError::Storage(_) => true,
            UploadError::SessionState(_) => false,
        }
    }

    fn is_user_facing(&self) -> bool {
        !matches!(self, UploadError::SessionState(_))
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(e) => e.to_string(),
            UploadError::Storage(_) => "The file could not be stored. Please try again.".to_string(),
            UploadError::SessionState(_) => {
                "The upload form is no longer active. Please reopen it.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            UploadError::Validation(_) => LogLevel::Debug,
            UploadError::Storage(_) => LogLevel::Error,
            UploadError::SessionState(_) => LogLevel::Warn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{Bucket, SessionStatus};
    use std::error::Error;

    #[test]
    fn validation_errors_are_recoverable_and_user_facing() {
        let err = UploadError::from(ValidationError::FileTooLarge { size: 3, max: 2 });
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert!(err.is_recoverable());
        assert!(err.is_user_facing());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.client_message().contains("too large"));
    }

    #[test]
    fn session_state_errors_are_usage_faults() {
        let err = UploadError::from(SessionStateError::NotActive {
            status: SessionStatus::Uninitialized,
        });
        assert!(!err.is_user_facing());
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn storage_errors_keep_their_cause() {
        let cause = std::io::Error::other("connection reset");
        let err = UploadError::from(StorageError::upload(Bucket::CompanyLogos, "c/logo.png", cause));
        assert_eq!(err.error_code(), "STORAGE_ERROR");

        let UploadError::Storage(storage) = &err else {
            panic!("expected storage error");
        };
        let source = storage.source().expect("cause");
        assert_eq!(source.to_string(), "connection reset");
    }
}
