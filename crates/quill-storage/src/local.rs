use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject, UploadOptions};
use async_trait::async_trait;
use bytes::Bytes;
use quill_core::{Bucket, StorageBackend};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live at `{base_path}/{bucket}/{path}`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/quill/storage")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/storage")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    /// Convert a bucket-relative key to a filesystem path.
    ///
    /// Rejects keys with traversal sequences; the resulting path always stays
    /// under `{base_path}/{bucket}`.
    fn key_to_path(&self, bucket: Bucket, storage_key: &str) -> StorageResult<PathBuf> {
        keys::validate_key(storage_key)?;

        let bucket_root = self.base_path.join(bucket.as_str());
        let path = bucket_root.join(storage_key);

        if path.strip_prefix(&bucket_root).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn count_files(dir: &Path) -> std::io::Result<usize> {
        let mut count = 0;
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = fs::read_dir(&current).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_dir() {
                    pending.push(entry.path());
                } else {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(
        &self,
        bucket: Bucket,
        storage_key: &str,
        _content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<StoredObject> {
        let path = self.key_to_path(bucket, storage_key)?;
        let size = data.len();

        if !options.upsert && fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::AlreadyExists {
                bucket,
                path: storage_key.to_string(),
            });
        }

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| StorageError::upload(bucket, storage_key, e))?;

        file.write_all(&data)
            .await
            .map_err(|e| StorageError::upload(bucket, storage_key, e))?;

        file.sync_all()
            .await
            .map_err(|e| StorageError::upload(bucket, storage_key, e))?;

        let url = self.public_url(bucket, storage_key);

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(StoredObject {
            path: storage_key.to_string(),
            url,
        })
    }

    async fn download(&self, bucket: Bucket, storage_key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(bucket, storage_key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::not_found(bucket, storage_key));
        }

        let data = fs::read(&path)
            .await
            .map_err(|e| StorageError::download(bucket, storage_key, e))?;

        Ok(Bytes::from(data))
    }

    async fn delete(&self, bucket: Bucket, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(bucket, storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::delete(bucket, storage_key, e))?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> StorageResult<usize> {
        let folder = prefix.trim_end_matches('/');
        let path = self.key_to_path(bucket, folder)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(0);
        }

        let removed = Self::count_files(&path)
            .await
            .map_err(|e| StorageError::delete(bucket, prefix, e))?;

        fs::remove_dir_all(&path)
            .await
            .map_err(|e| StorageError::delete(bucket, prefix, e))?;

        tracing::info!(
            path = %path.display(),
            bucket = %bucket,
            prefix = %prefix,
            removed,
            "Local storage folder delete successful"
        );

        Ok(removed)
    }

    async fn copy(&self, bucket: Bucket, from_key: &str, to_key: &str) -> StorageResult<()> {
        let from_path = self.key_to_path(bucket, from_key)?;
        let to_path = self.key_to_path(bucket, to_key)?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::not_found(bucket, from_key));
        }

        self.ensure_parent_dir(&to_path).await?;

        fs::copy(&from_path, &to_path)
            .await
            .map_err(|e| StorageError::copy(bucket, from_key, to_key, e))?;

        tracing::info!(
            bucket = %bucket,
            from_key = %from_key,
            to_key = %to_key,
            "Local storage copy successful"
        );

        Ok(())
    }

    async fn exists(&self, bucket: Bucket, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(bucket, storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn public_url(&self, bucket: Bucket, storage_key: &str) -> String {
        keys::object_url(&self.base_url, bucket, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    async fn relocate(&self, bucket: Bucket, from_key: &str, to_key: &str) -> StorageResult<()> {
        self.copy(bucket, from_key, to_key).await
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:4000/storage".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_storage_upload_download() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let data = Bytes::from_static(b"test data");
        let stored = storage
            .upload(
                Bucket::AuthorAvatars,
                "author-1/avatar-1-abc.png",
                "image/png",
                data.clone(),
                &UploadOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(stored.path, "author-1/avatar-1-abc.png");
        assert_eq!(
            stored.url,
            "http://localhost:4000/storage/author-avatars/author-1/avatar-1-abc.png"
        );
        assert!(dir
            .path()
            .join("author-avatars/author-1/avatar-1-abc.png")
            .exists());

        let downloaded = storage
            .download(Bucket::AuthorAvatars, &stored.path)
            .await
            .unwrap();
        assert_eq!(data, downloaded);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.download(Bucket::CompanyLogos, "../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete(Bucket::CompanyLogos, "../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists(Bucket::CompanyLogos, "/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_delete_nonexistent() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;

        let result = storage.delete(Bucket::ArticleImages, "nonexistent/file.png").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_upload_without_upsert_rejects_existing() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let options = UploadOptions::default();

        storage
            .upload(Bucket::CompanyLogos, "c/logo.png", "image/png", Bytes::from_static(b"1"), &options)
            .await
            .unwrap();
        let err = storage
            .upload(Bucket::CompanyLogos, "c/logo.png", "image/png", Bytes::from_static(b"2"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_local_storage_delete_prefix() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let options = UploadOptions::default();

        for key in ["e1/a.png", "e1/b.png", "e10/c.png"] {
            storage
                .upload(Bucket::ArticleImages, key, "image/png", Bytes::from_static(b"x"), &options)
                .await
                .unwrap();
        }

        let removed = storage.delete_prefix(Bucket::ArticleImages, "e1/").await.unwrap();
        assert_eq!(removed, 2);
        assert!(!storage.exists(Bucket::ArticleImages, "e1/a.png").await.unwrap());
        assert!(storage.exists(Bucket::ArticleImages, "e10/c.png").await.unwrap());

        let removed = storage.delete_prefix(Bucket::ArticleImages, "missing/").await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_local_storage_relocate_keeps_source() {
        let dir = tempdir().unwrap();
        let storage = storage(dir.path()).await;
        let data = Bytes::from_static(b"original content");

        storage
            .upload(
                Bucket::FeaturedImages,
                "temp/s1/featured-1-x.jpg",
                "image/jpeg",
                data.clone(),
                &UploadOptions::default(),
            )
            .await
            .unwrap();

        storage
            .relocate(Bucket::FeaturedImages, "temp/s1/featured-1-x.jpg", "a1/featured-1-x.jpg")
            .await
            .unwrap();

        assert!(storage
            .exists(Bucket::FeaturedImages, "temp/s1/featured-1-x.jpg")
            .await
            .unwrap());
        let copied = storage
            .download(Bucket::FeaturedImages, "a1/featured-1-x.jpg")
            .await
            .unwrap();
        assert_eq!(data, copied);
    }
}
