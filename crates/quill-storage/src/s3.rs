use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject, UploadOptions};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutMode, PutOptions, PutPayload, Result as ObjectResult,
};
use quill_core::{Bucket, StorageBackend};
use std::collections::HashMap;

/// S3 storage implementation
///
/// Holds one object store per bucket of the fixed namespace.
#[derive(Clone)]
pub struct S3Storage {
    stores: HashMap<Bucket, AmazonS3>,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `buckets` - Buckets to open; each must already exist
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        buckets: &[Bucket],
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut stores = HashMap::with_capacity(buckets.len());

        for bucket in buckets {
            let mut builder = AmazonS3Builder::from_env()
                .with_region(region.clone())
                .with_bucket_name(bucket.as_str());

            if let Some(ref endpoint) = endpoint_url {
                let allow_http = endpoint.starts_with("http://");
                builder = builder
                    .with_endpoint(endpoint.clone())
                    .with_allow_http(allow_http);
            }

            let store = builder
                .build()
                .map_err(|e| StorageError::ConfigError(format!("{}: {}", bucket, e)))?;
            stores.insert(*bucket, store);
        }

        Ok(S3Storage {
            stores,
            region,
            endpoint_url,
        })
    }

    fn store(&self, bucket: Bucket) -> StorageResult<&AmazonS3> {
        self.stores
            .get(&bucket)
            .ok_or(StorageError::BucketNotFound(bucket))
    }

    fn location(storage_key: &str) -> StorageResult<Path> {
        keys::validate_key(storage_key)?;
        Ok(Path::from(storage_key.to_string()))
    }

    fn put_options(content_type: &str, options: &UploadOptions) -> PutOptions {
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        if let Some(ref max_age) = options.cache_control {
            attributes.insert(
                Attribute::CacheControl,
                format!("max-age={}", max_age).into(),
            );
        }

        PutOptions {
            mode: if options.upsert {
                PutMode::Overwrite
            } else {
                PutMode::Create
            },
            attributes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn upload(
        &self,
        bucket: Bucket,
        storage_key: &str,
        content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<StoredObject> {
        let store = self.store(bucket)?;
        let location = Self::location(storage_key)?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            store,
            &location,
            PutPayload::from(data),
            Self::put_options(content_type, options),
        )
        .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            match e {
                ObjectStoreError::AlreadyExists { .. } => StorageError::AlreadyExists {
                    bucket,
                    path: storage_key.to_string(),
                },
                other => StorageError::upload(bucket, storage_key, other),
            }
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(StoredObject {
            path: storage_key.to_string(),
            url: self.public_url(bucket, storage_key),
        })
    }

    async fn download(&self, bucket: Bucket, storage_key: &str) -> StorageResult<Bytes> {
        let store = self.store(bucket)?;
        let location = Self::location(storage_key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::not_found(bucket, storage_key),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::download(bucket, storage_key, other)
            }
        })?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::download(bucket, storage_key, e))
    }

    async fn delete(&self, bucket: Bucket, storage_key: &str) -> StorageResult<()> {
        let store = self.store(bucket)?;
        let location = Self::location(storage_key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.delete(&location).await;

        match result {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::delete(bucket, storage_key, e));
            }
        }

        tracing::info!(
            bucket = %bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> StorageResult<usize> {
        let store = self.store(bucket)?;
        let folder = Self::location(prefix.trim_end_matches('/'))?;
        let start = std::time::Instant::now();

        let listed: Vec<Path> = object_store::ObjectStore::list(store, Some(&folder))
            .map_ok(|meta| meta.location)
            .try_collect()
            .await
            .map_err(|e| StorageError::delete(bucket, prefix, e))?;

        for location in &listed {
            match store.delete(location).await {
                Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {}
                Err(e) => return Err(StorageError::delete(bucket, location.as_ref(), e)),
            }
        }

        tracing::info!(
            bucket = %bucket,
            prefix = %prefix,
            removed = listed.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 folder delete successful"
        );

        Ok(listed.len())
    }

    async fn copy(&self, bucket: Bucket, from_key: &str, to_key: &str) -> StorageResult<()> {
        let store = self.store(bucket)?;
        let from = Self::location(from_key)?;
        let to = Self::location(to_key)?;
        let start = std::time::Instant::now();

        let copy_result: ObjectResult<_> = store.copy(&from, &to).await;

        copy_result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::not_found(bucket, from_key),
            other => StorageError::copy(bucket, from_key, to_key, other),
        })?;

        tracing::info!(
            bucket = %bucket,
            from_key = %from_key,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: Bucket, storage_key: &str) -> StorageResult<bool> {
        let store = self.store(bucket)?;
        let location = Self::location(storage_key)?;
        match store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::download(bucket, storage_key, e)),
        }
    }

    /// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
    /// For S3-compatible providers, path-style under the endpoint.
    fn public_url(&self, bucket: Bucket, storage_key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            keys::object_url(endpoint, bucket, storage_key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket,
                self.region,
                keys::encode_path(storage_key)
            )
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    async fn relocate(&self, bucket: Bucket, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.copy(bucket, from_key, to_key).await
    }
}
