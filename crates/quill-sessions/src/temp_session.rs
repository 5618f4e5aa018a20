//! Temporary upload sessions
//!
//! Older forms upload before the owning entity exists by staging files under
//! `temp/{session_id}/`. Each staged file is later moved into its entity
//! folder, or deleted when the form is cancelled.

use quill_core::{Bucket, SessionStateError, SessionStatus, UploadFile, ValidationError};
use quill_storage::{keys, StorageGateway, StoredObject, TempAsset, UploadError};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::report::{CleanupReport, ObjectRef};

struct TempState {
    status: SessionStatus,
    files: Vec<ObjectRef>,
}

pub struct TemporarySession {
    gateway: StorageGateway,
    session_id: String,
    state: Mutex<TempState>,
}

impl TemporarySession {
    pub fn new(gateway: StorageGateway) -> Self {
        let session_id = keys::generate_id();
        tracing::debug!(session_id = %session_id, "Temporary upload session opened");

        Self {
            gateway,
            session_id,
            state: Mutex::new(TempState {
                status: SessionStatus::Active,
                files: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, TempState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status
    }

    pub fn tracked_files(&self) -> Vec<ObjectRef> {
        self.state().files.clone()
    }

    /// Validate and stage a file under this session's prefix, then track it.
    #[tracing::instrument(skip(self, file), fields(session_id = %self.session_id, file_name = %file.name))]
    pub async fn upload_temporary(
        &self,
        file: &UploadFile,
        asset: TempAsset,
    ) -> Result<StoredObject, UploadError> {
        {
            let state = self.state();
            if state.status != SessionStatus::Active {
                return Err(SessionStateError::NotActive {
                    status: state.status,
                }
                .into());
            }
        }

        let (entry, stored) = self
            .gateway
            .upload_temporary(&self.session_id, asset, file)
            .await?;
        let object = ObjectRef::new(entry.bucket, stored.path.clone());

        let closed_as = {
            let mut state = self.state();
            if state.status == SessionStatus::Active {
                state.files.push(object.clone());
                None
            } else {
                Some(state.status)
            }
        };

        if let Some(status) = closed_as {
            if status == SessionStatus::CleanedUp {
                if let Err(e) = self.gateway.delete(object.bucket, &object.path).await {
                    tracing::error!(
                        error = %e,
                        bucket = %object.bucket,
                        path = %object.path,
                        "Failed to delete temporary upload that finished after cleanup"
                    );
                }
            } else {
                tracing::warn!(
                    status = %status,
                    bucket = %object.bucket,
                    path = %object.path,
                    "Temporary upload finished after the session closed"
                );
            }
            return Err(SessionStateError::ClosedDuringUpload { status }.into());
        }

        Ok(stored)
    }

    /// Track a file uploaded elsewhere so cleanup removes it.
    pub fn track_upload(&self, bucket: Bucket, path: impl Into<String>) {
        let object = ObjectRef::new(bucket, path);
        let mut state = self.state();

        if state.status != SessionStatus::Active {
            tracing::warn!(
                session_id = %self.session_id,
                bucket = %object.bucket,
                path = %object.path,
                "Temporary session is closed, file not tracked"
            );
            return;
        }

        if !state.files.contains(&object) {
            state.files.push(object);
        }
    }

    /// Move a temporary object to `{entity_id}/{file_name}` and return its URL.
    ///
    /// Only objects under this session's own `temp/{session_id}/` prefix can
    /// be moved, and only while the session is active. The copy must succeed
    /// or the temporary object stays where it is. A failure to delete the
    /// temporary object afterwards is only logged.
    #[tracing::instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn move_to_permanent(
        &self,
        bucket: Bucket,
        temp_path: &str,
        entity_id: &str,
    ) -> Result<String, UploadError> {
        {
            let state = self.state();
            if state.status != SessionStatus::Active {
                return Err(SessionStateError::NotActive {
                    status: state.status,
                }
                .into());
            }
        }

        if !temp_path.starts_with(&keys::temp_prefix(&self.session_id)) {
            tracing::warn!(
                path = %temp_path,
                "Refusing to move an object outside this session's temporary folder"
            );
            return Err(ValidationError::InvalidFilename(temp_path.to_string()).into());
        }

        let destination = self
            .gateway
            .policy()
            .permanent_path_for(temp_path, entity_id)?;
        let url = self
            .gateway
            .move_object(bucket, temp_path, &destination)
            .await?;

        self.state()
            .files
            .retain(|f| !(f.bucket == bucket && f.path == temp_path));

        tracing::info!(
            bucket = %bucket,
            from = %temp_path,
            to = %destination,
            "Moved temporary file to permanent location"
        );

        Ok(url)
    }

    pub async fn move_featured_image_to_article(
        &self,
        temp_path: &str,
        article_id: &str,
    ) -> Result<String, UploadError> {
        self.move_to_permanent(Bucket::FeaturedImages, temp_path, article_id)
            .await
    }

    /// Delete every tracked file. A failed delete never stops the others.
    #[tracing::instrument(skip(self), fields(session_id = %self.session_id))]
    pub async fn cleanup_session(&self) -> CleanupReport {
        let files = {
            let mut state = self.state();
            if state.status.is_terminal() {
                return CleanupReport::default();
            }
            state.status = SessionStatus::CleanedUp;
            std::mem::take(&mut state.files)
        };

        let mut report = CleanupReport::default();
        for file in files {
            match self.gateway.delete(file.bucket, &file.path).await {
                Ok(()) => {
                    tracing::debug!(bucket = %file.bucket, path = %file.path, "Deleted temporary file");
                    report.deleted_objects += 1;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        bucket = %file.bucket,
                        path = %file.path,
                        "Failed to delete temporary file, continuing"
                    );
                    report.failures.push(e.to_string());
                    report.orphaned.push(file);
                }
            }
        }

        tracing::info!(
            deleted = report.deleted_objects,
            failed = report.failures.len(),
            "Temporary session cleaned up"
        );

        report
    }

    /// Drop the bookkeeping without deleting anything.
    ///
    /// Returns files still tracked, which were never moved out of `temp/`.
    pub fn commit_session(&self) -> Vec<ObjectRef> {
        let mut state = self.state();
        if state.status.is_terminal() {
            tracing::warn!(
                session_id = %self.session_id,
                status = %state.status,
                "Temporary session already finished"
            );
            return Vec::new();
        }

        state.status = SessionStatus::Committed;
        let remaining = std::mem::take(&mut state.files);
        if !remaining.is_empty() {
            tracing::warn!(
                session_id = %self.session_id,
                remaining = remaining.len(),
                "Committed temporary session still tracks files that were never moved"
            );
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_storage::{InMemoryStorage, Storage};
    use std::sync::Arc;

    fn session() -> (Arc<InMemoryStorage>, TemporarySession) {
        let storage = Arc::new(InMemoryStorage::default());
        let gateway = StorageGateway::new(storage.clone());
        (storage, TemporarySession::new(gateway))
    }

    fn jpeg() -> UploadFile {
        UploadFile::new("hero.jpg", "image/jpeg", vec![3u8; 128])
    }

    #[tokio::test]
    async fn upload_temporary_stages_under_session_prefix() {
        let (_, session) = session();
        let stored = session
            .upload_temporary(&jpeg(), TempAsset::FeaturedImage)
            .await
            .unwrap();

        assert!(stored
            .path
            .starts_with(&format!("temp/{}/featured-", session.session_id())));
        assert_eq!(
            session.tracked_files(),
            vec![ObjectRef::new(Bucket::FeaturedImages, stored.path)]
        );
    }

    #[tokio::test]
    async fn track_upload_ignores_duplicates() {
        let (_, session) = session();
        session.track_upload(Bucket::CompanyLogos, "temp/x/logo.png");
        session.track_upload(Bucket::CompanyLogos, "temp/x/logo.png");
        assert_eq!(session.tracked_files().len(), 1);
    }

    #[tokio::test]
    async fn move_untracks_file() {
        let (storage, session) = session();
        let stored = session
            .upload_temporary(&jpeg(), TempAsset::FeaturedImage)
            .await
            .unwrap();

        let url = session
            .move_featured_image_to_article(&stored.path, "article-1")
            .await
            .unwrap();

        assert!(url.starts_with("memory://featured-images/article-1/featured-"));
        assert!(session.tracked_files().is_empty());
        assert!(!storage
            .exists(Bucket::FeaturedImages, &stored.path)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn move_rejects_non_temporary_source() {
        let (_, session) = session();
        let err = session
            .move_to_permanent(Bucket::FeaturedImages, "article-1/featured.jpg", "article-2")
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn move_rejects_other_sessions_files() {
        let (storage, owner) = session();
        let stored = owner
            .upload_temporary(&jpeg(), TempAsset::FeaturedImage)
            .await
            .unwrap();
        let other = TemporarySession::new(StorageGateway::new(storage.clone()));

        let err = other
            .move_featured_image_to_article(&stored.path, "article-3")
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(storage
            .exists(Bucket::FeaturedImages, &stored.path)
            .await
            .unwrap());
        assert_eq!(owner.tracked_files().len(), 1);
    }

    #[tokio::test]
    async fn commit_returns_unmoved_files_and_deletes_nothing() {
        let (storage, session) = session();
        session
            .upload_temporary(&jpeg(), TempAsset::FeaturedImage)
            .await
            .unwrap();

        let remaining = session.commit_session();
        assert_eq!(remaining.len(), 1);
        assert_eq!(storage.object_count().await, 1);
        assert_eq!(session.status(), SessionStatus::Committed);

        let err = session
            .upload_temporary(&jpeg(), TempAsset::FeaturedImage)
            .await
            .unwrap_err();
        assert!(err.is_session_state());
    }
}
