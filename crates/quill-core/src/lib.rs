//! Quill Core Library
//!
//! This crate provides the domain models, asset classes, validation rules,
//! configuration and error types shared by every Quill upload component.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{Config, StorageSettings, UploadServiceConfig};
pub use error::{ErrorMetadata, LogLevel, SessionStateError};
pub use models::{
    AssetClass, EntityType, FileRole, SessionMode, SessionStatus, UploadFile, UploadedFile,
};
pub use storage_types::{Bucket, StorageBackend};
pub use validation::{AssetValidator, ValidationError, ValidationResult};
