//! Recording storage for session tests
//!
//! Wraps the in-memory backend, records every call and can be told to fail
//! or stall specific operations.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use quill_core::UploadFile;
use quill_storage::{
    Bucket, InMemoryStorage, Storage, StorageBackend, StorageError, StorageGateway,
    StorageResult, StoredObject, UploadOptions,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload { bucket: Bucket, path: String },
    Download { bucket: Bucket, path: String },
    Delete { bucket: Bucket, path: String },
    DeletePrefix { bucket: Bucket, prefix: String },
    Copy { bucket: Bucket, from: String, to: String },
    Relocate { bucket: Bucket, from: String, to: String },
}

pub struct RecordingStorage {
    inner: InMemoryStorage,
    calls: Mutex<Vec<Call>>,
    fail_writes: AtomicBool,
    fail_deletes: AtomicBool,
    fail_prefix_deletes: AtomicBool,
    failing_paths: Mutex<HashSet<String>>,
    gated: AtomicBool,
    gate: Semaphore,
    upload_started: Notify,
}

impl RecordingStorage {
    pub fn new() -> Arc<Self> {
        Self::wrap(InMemoryStorage::default())
    }

    /// Backend without server-side copy; moves download and re-upload.
    pub fn without_native_copy() -> Arc<Self> {
        Self::wrap(InMemoryStorage::default().without_native_copy())
    }

    fn wrap(inner: InMemoryStorage) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_prefix_deletes: AtomicBool::new(false),
            failing_paths: Mutex::new(HashSet::new()),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            upload_started: Notify::new(),
        })
    }

    pub fn gateway(self: &Arc<Self>) -> StorageGateway {
        StorageGateway::new(self.clone())
    }

    pub fn inner(&self) -> &InMemoryStorage {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn deletes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Delete { .. }))
            .collect()
    }

    pub fn prefix_deletes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DeletePrefix { .. }))
            .collect()
    }

    pub fn upload_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Upload { .. }))
            .count()
    }

    /// Fail uploads and relocations.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_prefix_deletes(&self, fail: bool) {
        self.fail_prefix_deletes.store(fail, Ordering::SeqCst);
    }

    /// Fail deletes of one specific path only.
    pub fn fail_delete_of(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    /// Hold every upload until [`Self::release_uploads`].
    pub fn hold_uploads(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release_uploads(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.add_permits(1024);
    }

    /// Resolves once a held upload has reached the backend.
    pub async fn upload_reached_backend(&self) {
        self.upload_started.notified().await;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn injected(&self, bucket: Bucket, path: &str) -> StorageError {
        StorageError::delete(bucket, path, std::io::Error::other("injected failure"))
    }
}

#[async_trait]
impl Storage for RecordingStorage {
    async fn upload(
        &self,
        bucket: Bucket,
        path: &str,
        content_type: &str,
        data: Bytes,
        options: &UploadOptions,
    ) -> StorageResult<StoredObject> {
        self.record(Call::Upload {
            bucket,
            path: path.to_string(),
        });

        if self.gated.load(Ordering::SeqCst) {
            self.upload_started.notify_one();
            let _permit = self.gate.acquire().await.expect("upload gate closed");
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::upload(
                bucket,
                path,
                std::io::Error::other("injected failure"),
            ));
        }
        self.inner
            .upload(bucket, path, content_type, data, options)
            .await
    }

    async fn download(&self, bucket: Bucket, path: &str) -> StorageResult<Bytes> {
        self.record(Call::Download {
            bucket,
            path: path.to_string(),
        });
        self.inner.download(bucket, path).await
    }

    async fn delete(&self, bucket: Bucket, path: &str) -> StorageResult<()> {
        self.record(Call::Delete {
            bucket,
            path: path.to_string(),
        });
        if self.fail_deletes.load(Ordering::SeqCst)
            || self.failing_paths.lock().unwrap().contains(path)
        {
            return Err(self.injected(bucket, path));
        }
        self.inner.delete(bucket, path).await
    }

    async fn delete_prefix(&self, bucket: Bucket, prefix: &str) -> StorageResult<usize> {
        self.record(Call::DeletePrefix {
            bucket,
            prefix: prefix.to_string(),
        });
        if self.fail_prefix_deletes.load(Ordering::SeqCst) {
            return Err(self.injected(bucket, prefix));
        }
        self.inner.delete_prefix(bucket, prefix).await
    }

    async fn copy(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()> {
        self.record(Call::Copy {
            bucket,
            from: from.to_string(),
            to: to.to_string(),
        });
        self.inner.copy(bucket, from, to).await
    }

    async fn exists(&self, bucket: Bucket, path: &str) -> StorageResult<bool> {
        self.inner.exists(bucket, path).await
    }

    fn public_url(&self, bucket: Bucket, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    async fn relocate(&self, bucket: Bucket, from: &str, to: &str) -> StorageResult<()> {
        self.record(Call::Relocate {
            bucket,
            from: from.to_string(),
            to: to.to_string(),
        });
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::copy(
                bucket,
                from,
                to,
                std::io::Error::other("injected failure"),
            ));
        }
        self.inner.relocate(bucket, from, to).await
    }
}

pub fn png(name: &str) -> UploadFile {
    UploadFile::new(name, "image/png", vec![0x89u8; 256])
}

pub fn jpeg(name: &str, data: &[u8]) -> UploadFile {
    UploadFile::new(name, "image/jpeg", data.to_vec())
}
