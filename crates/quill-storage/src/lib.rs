//! Quill Storage Library
//!
//! This crate provides the storage abstraction, the path policy and the
//! storage gateway used by upload sessions.
//!
//! # Object path format
//!
//! Paths are relative to a bucket. Two namespaces exist and never overlap:
//!
//! - **Permanent**: `{entity_id}/{role_prefix}-{unix_millis}-{token}.{ext}`
//! - **Temporary**: `temp/{session_id}/{role_prefix}-{unix_millis}-{token}.{ext}`
//!
//! Paths must not contain `..` or a leading `/`. Path generation is centralized
//! in the `keys` and `policy` modules so all backends stay consistent.

pub mod error;
pub mod factory;
pub mod gateway;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod policy;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use error::UploadError;
pub use factory::create_storage;
pub use gateway::StorageGateway;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::InMemoryStorage;
pub use policy::{PathPolicy, PolicyEntry, TempAsset};
pub use quill_core::{Bucket, StorageBackend};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredObject, UploadOptions};
