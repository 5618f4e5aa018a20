use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject, UploadOptions};
use async_trait::async_trait;
use bytes::Bytes;
use quill_core::{Bucket, StorageBackend};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    content_type: String,
    cache_control: Option<String>,
}

/// In-memory storage implementation.
///
/// Objects live in a `BTreeMap` keyed by `(bucket, path)`, which gives
/// deterministic iteration for prefix deletes and tests. Used by tests and by
/// the CLI's `memory` backend.
#[derive(Debug, Clone)]
pub struct InMemoryStorage {
    objects: Arc<RwLock<BTreeMap<(Bucket, String), StoredBlob>>>,
    base_url: String,
    native_copy: bool,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new("memory://")
    }
}

impl InMemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            base_url: base_url.into(),
            native_copy: true,
        }
    }

    /// Behave like a backend without server-side copy; `copy` then fails with
    /// `Unsupported` and moves fall back to download and re-upload.
    pub fn without_native_copy(mut self) -> Self {
        self.native_copy = false;
        self
    }

    /// Paths currently stored in `bucket`.
    pub async fn paths(&self, bucket: Bucket) -> Vec<String> {
        let objs = self.objects.read().await;
        objs.keys()
            .filter(|(b, _)| *b == bucket)
            .map(|(_, path)| path.clone())
            .collect()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn content_type(&self, bucket: Bucket, path: &str) -> Option<String> {
        let objs = self.objects.read().await;
        objs.get(&(bucket, path.to_string()))
            .map(|blob| blob.content_type.clone())
    }

    pub async fn cache_control(&self, bucket: Bucket, path: &str) -> Option<String> {
        let objs = self.objects.read().await;
        objs.get(&(bucket, path.to_string()))
            .and_then(|blob| blob.cache_control.clone())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<StoredObject> {
        keys::validate_key(path)?;
        let size = data.len();

        let mut objs = self.objects.write().await;
        let key = (bucket, path.to_string());
        if !options.upsert && objs.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                bucket,
                path: path.to_string(),
            });
        }
        objs.insert(
            key,
            StoredBlob {
                data,
                content_type: content_type.to_string(),
                cache_control: options.cache_control.clone(),
            },
        );

        tracing::debug!(bucket = %bucket, key = %path, size_bytes = size, "Memory storage upload");

        Ok(StoredObject {
            path: path.to_string(),
            url: self.public_url(bucket, path),
        })
    }

    async fn download(&self, bucket: Bucket, path: &str) -> StorageResult<Bytes> {
        keys::validate_key(path)?;
        let objs = self.objects.read().await;
        objs.get(&(bucket, path.to_string()))
            .map(|blob| blob.data.clone())
            .ok_or_else(|| StorageError::not_found(bucket, path))
    }

    async fn delete(&self, bucket: Bucket, path: &str) -> StorageResult<()> {
        keys::validate_key(path)?;
        let mut objs = self.objects.write().await;
        objs.remove(&(bucket, path.to_string()));
        Ok(())
    }

    async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> StorageResult<usize> {
        keys::validate_key(prefix)?;
        let mut objs = self.objects.write().await;
        let before = objs.len();
        objs.retain(|(b, path), _| !(*b == bucket && path.starts_with(prefix)));
        Ok(before - objs.len())
    }

    async fn copy(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()> {
        if !self.native_copy {
            return Err(StorageError::Unsupported {
                backend: StorageBackend::Memory,
                operation: "copy",
            });
        }
        keys::validate_key(from)?;
        keys::validate_key(to)?;

        let mut objs = self.objects.write().await;
        let blob = objs
            .get(&(bucket, from.to_string()))
            .cloned()
            .ok_or_else(|| StorageError::not_found(bucket, from))?;
        objs.insert((bucket, to.to_string()), blob);
        Ok(())
    }

    async fn exists(&self, bucket: Bucket, path: &str) -> StorageResult<bool> {
        keys::validate_key(path)?;
        Ok(self
            .objects
            .read()
            .await
            .contains_key(&(bucket, path.to_string())))
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        keys::object_url(&self.base_url, bucket, path)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn relocate(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()> {
        if self.native_copy {
            return self.copy(bucket, from, to).await;
        }

        let data = self.download(bucket, from).await?;
        let content_type = self
            .content_type(bucket, from)
            .await
            .unwrap_or_else(|| keys::content_type_for_path(to).to_string());
        self.upload(
            bucket,
            to,
            &content_type,
            data,
            &UploadOptions::default().upsert(),
        )
        .await?;
        Ok(())
    }
}
