//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use quill_core::{Bucket, StorageBackend};
use thiserror::Error;

/// Boxed backend error kept as the `source` of a [`StorageError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Storage operation errors
///
/// Backend-specific failures are wrapped with the bucket and path they
/// concerned; the original cause stays reachable through `source()`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed for {bucket}/{path}: {source}")]
    UploadFailed {
        bucket: Bucket,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Download failed for {bucket}/{path}: {source}")]
    DownloadFailed {
        bucket: Bucket,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Delete failed for {bucket}/{path}: {source}")]
    DeleteFailed {
        bucket: Bucket,
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Copy failed in {bucket} from {from} to {to}: {source}")]
    CopyFailed {
        bucket: Bucket,
        from: String,
        to: String,
        #[source]
        source: BoxError,
    },

    #[error("File not found: {bucket}/{path}")]
    NotFound { bucket: Bucket, path: String },

    #[error("Object already exists: {bucket}/{path}")]
    AlreadyExists { bucket: Bucket, path: String },

    #[error("Bucket not configured: {0}")]
    BucketNotFound(Bucket),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("{operation} is not supported by the {backend} backend")]
    Unsupported {
        backend: StorageBackend,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn upload(bucket: Bucket, path: &str, source: impl Into<BoxError>) -> Self {
        StorageError::UploadFailed {
            bucket,
            path: path.to_string(),
            source: source.into(),
        }
    }

    pub fn download(bucket: Bucket, path: &str, source: impl Into<BoxError>) -> Self {
        StorageError::DownloadFailed {
            bucket,
            path: path.to_string(),
            source: source.into(),
        }
    }

    pub fn delete(bucket: Bucket, path: &str, source: impl Into<BoxError>) -> Self {
        StorageError::DeleteFailed {
            bucket,
            path: path.to_string(),
            source: source.into(),
        }
    }

    pub fn copy(bucket: Bucket, from: &str, to: &str, source: impl Into<BoxError>) -> Self {
        StorageError::CopyFailed {
            bucket,
            from: from.to_string(),
            to: to.to_string(),
            source: source.into(),
        }
    }

    pub fn not_found(bucket: Bucket, path: &str) -> Self {
        StorageError::NotFound {
            bucket,
            path: path.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Options passed through to the backend on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Cache lifetime in seconds, sent as `Cache-Control: max-age=...` where supported.
    pub cache_control: Option<String>,
    /// Overwrite an existing object instead of failing.
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            cache_control: Some("3600".to_string()),
            upsert: false,
        }
    }
}

impl UploadOptions {
    pub fn with_cache_control(cache_control: impl Into<String>) -> Self {
        Self {
            cache_control: Some(cache_control.into()),
            upsert: false,
        }
    }

    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }
}

/// Location of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) implement this trait.
/// Sessions and the gateway hold it as `Arc<dyn Storage>` and never depend on a
/// concrete backend.
///
/// **Path format:** paths are bucket-relative; see the crate root documentation.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload bytes to `path` in `bucket` and return the stored location and its public URL.
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<StoredObject>;

    /// Download an object's bytes
    async fn download(&self, bucket: Bucket, path: &str) -> StorageResult<Bytes>;

    /// Delete one object. Deleting a missing object succeeds.
    async fn delete(&self, bucket: Bucket, path: &str) -> StorageResult<()>;

    /// Delete every object whose path starts with `prefix`; returns how many were removed.
    async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> StorageResult<usize>;

    /// Server-side copy inside one bucket
    async fn copy(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, bucket: Bucket, path: &str) -> StorageResult<bool>;

    /// Publicly resolvable URL of an object. Does not check existence.
    fn public_url(&self, bucket: Bucket, path: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Place a copy of `from` at `to`, leaving `from` untouched.
    ///
    /// This is the copy half of a move. Backends with a server-side copy use
    /// it; others download the bytes and upload them again, keeping the
    /// source content type. On error nothing has been written at `to` that
    /// callers may rely on.
    async fn relocate(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()>;
}
