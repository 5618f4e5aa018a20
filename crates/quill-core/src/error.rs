//! Error types module
//!
//! Shared pieces of the upload error taxonomy. Validation errors live in
//! [`crate::validation`]; storage errors live in the storage crate, which also
//! defines the `UploadError` enum that unifies all three.

use crate::models::{SessionMode, SessionStatus};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for usage faults and recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the UI layer.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the user can recover (pick another file, retry)
    fn is_recoverable(&self) -> bool;

    /// Whether the error should be shown to the user at all
    fn is_user_facing(&self) -> bool;

    /// Message suitable for showing inline next to the form field
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Session operation attempted in the wrong state or mode.
///
/// These are programming-usage faults, not user-facing conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionStateError {
    #[error("No active upload session (status: {status})")]
    NotActive { status: SessionStatus },

    #[error("Operation {operation} is not valid for a {mode} session")]
    InvalidMode {
        operation: &'static str,
        mode: SessionMode,
    },

    #[error("Edit session requires the id of an existing entity")]
    MissingEntityId,

    #[error("Session closed ({status}) while an upload was in flight")]
    ClosedDuringUpload { status: SessionStatus },
}
