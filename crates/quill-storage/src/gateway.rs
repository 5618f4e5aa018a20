//! Storage gateway
//!
//! Typed front door to the object-storage backend. Uploads go through the
//! path policy's validation before any network call; every backend failure
//! surfaces as a [`StorageError`] carrying the original cause.

use bytes::Bytes;
use quill_core::{
    AssetClass, AssetValidator, Bucket, Config, EntityType, FileRole, UploadFile,
    ValidationResult,
};
use std::sync::Arc;

use crate::error::UploadError;
use crate::keys;
use crate::policy::{PathPolicy, PolicyEntry, TempAsset};
use crate::traits::{Storage, StorageError, StoredObject, UploadOptions};

#[derive(Clone)]
pub struct StorageGateway {
    storage: Arc<dyn Storage>,
    policy: PathPolicy,
    options: UploadOptions,
}

impl StorageGateway {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            policy: PathPolicy::new(),
            options: UploadOptions::default(),
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(storage).with_options(UploadOptions::with_cache_control(config.cache_control()))
    }

    /// Default options applied to uploads that don't pass their own.
    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn validate(&self, file: &UploadFile, asset_class: AssetClass) -> ValidationResult {
        self.policy.validate(file, asset_class)
    }

    pub fn build_path(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        role: FileRole,
        original_name: &str,
        content_type: &str,
    ) -> Result<(PolicyEntry, String), UploadError> {
        Ok(self
            .policy
            .build_path(entity_type, entity_id, role, original_name, content_type)?)
    }

    /// Passthrough upload; no validation.
    #[tracing::instrument(skip_all, fields(bucket = %bucket, path = %path, size_bytes = file.size()))]
    pub async fn upload(
        &self,
        file: &UploadFile,
        bucket: Bucket,
        path: &str,
        options: Option<&UploadOptions>,
    ) -> Result<StoredObject, StorageError> {
        self.storage
            .upload(
                bucket,
                path,
                &file.content_type,
                file.data.clone(),
                options.unwrap_or(&self.options),
            )
            .await
    }

    /// Validate `file` against `asset_class`, then upload it.
    pub async fn upload_asset(
        &self,
        file: &UploadFile,
        asset_class: AssetClass,
        bucket: Bucket,
        path: &str,
    ) -> Result<StoredObject, UploadError> {
        AssetValidator::new(asset_class)
            .validate_all(file)
            .inspect_err(|e| {
                tracing::debug!(
                    asset_class = %asset_class,
                    file_name = %file.name,
                    error = %e,
                    "Rejected upload before contacting storage"
                );
            })?;

        Ok(self.upload(file, bucket, path, None).await?)
    }

    /// Upload a file to its final location under the entity prefix.
    pub async fn upload_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        role: FileRole,
        file: &UploadFile,
    ) -> Result<(PolicyEntry, StoredObject), UploadError> {
        let (entry, path) = self.policy.build_path(
            entity_type,
            entity_id,
            role,
            &file.name,
            &file.content_type,
        )?;
        let stored = self
            .upload_asset(file, entry.asset_class, entry.bucket, &path)
            .await?;
        Ok((entry, stored))
    }

    /// Upload a file under a temporary session prefix.
    pub async fn upload_temporary(
        &self,
        session_id: &str,
        asset: TempAsset,
        file: &UploadFile,
    ) -> Result<(PolicyEntry, StoredObject), UploadError> {
        let entry = asset.entry();
        let path = self
            .policy
            .build_temp_path(session_id, asset, &file.name, &file.content_type)?;
        let stored = self
            .upload_asset(file, entry.asset_class, entry.bucket, &path)
            .await?;
        Ok((entry, stored))
    }

    pub async fn download(&self, bucket: Bucket, path: &str) -> Result<Bytes, StorageError> {
        self.storage.download(bucket, path).await
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, path = %path))]
    pub async fn delete(&self, bucket: Bucket, path: &str) -> Result<(), StorageError> {
        self.storage.delete(bucket, path).await
    }

    #[tracing::instrument(skip_all, fields(bucket = %bucket, prefix = %prefix))]
    pub async fn delete_folder(&self, bucket: Bucket, prefix: &str) -> Result<usize, StorageError> {
        self.storage.delete_prefix(bucket, prefix).await
    }

    /// Delete the `{entity_id}/` folder in every bucket the entity type writes to.
    ///
    /// Every bucket is attempted even if an earlier one fails; the first
    /// failure is returned.
    #[tracing::instrument(skip_all, fields(entity_type = %entity_type, entity_id = %entity_id))]
    pub async fn delete_entity_folders(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> Result<usize, UploadError> {
        keys::validate_entity_id(entity_id)?;
        let prefix = keys::entity_prefix(entity_id);

        let mut removed = 0;
        let mut first_error = None;
        for bucket in self.policy.buckets_for(entity_type) {
            match self.delete_folder(bucket, &prefix).await {
                Ok(count) => removed += count,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        bucket = %bucket,
                        prefix = %prefix,
                        "Failed to delete entity folder"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(removed),
        }
    }

    pub async fn copy(&self, bucket: Bucket, from: &str, to: &str) -> Result<(), StorageError> {
        self.storage.copy(bucket, from, to).await
    }

    pub fn public_url(&self, bucket: Bucket, path: &str) -> String {
        self.storage.public_url(bucket, path)
    }

    /// Move an object inside one bucket and return the destination's public URL.
    ///
    /// If placing the destination fails, the source is left untouched and the
    /// error is returned. If only the removal of the source fails, the move
    /// still succeeds; the leftover source is logged for the sweep job.
    #[tracing::instrument(skip_all, fields(bucket = %bucket, from = %from, to = %to))]
    pub async fn move_object(
        &self,
        bucket: Bucket,
        from: &str,
        to: &str,
    ) -> Result<String, StorageError> {
        let start = std::time::Instant::now();

        self.storage
            .relocate(bucket, from, to)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    error = %e,
                    backend = %self.storage.backend_type(),
                    "Move failed before the destination was written; source kept"
                );
            })?;

        if let Err(e) = self.storage.delete(bucket, from).await {
            tracing::warn!(
                error = %e,
                orphaned_path = %from,
                "Moved object but failed to delete the source"
            );
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object moved"
        );

        Ok(self.public_url(bucket, to))
    }
}
