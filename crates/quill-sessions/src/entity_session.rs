//! Entity upload session
//!
//! Binds every upload made from one create or edit form to a single entity id.
//! A create session mints the id before the first upload, so files land in
//! their final folder straight away and cancelling deletes that folder. An
//! edit session reuses the persisted entity's id and never deletes anything
//! on cancel.

use chrono::{DateTime, Utc};
use quill_core::{
    EntityType, FileRole, SessionMode, SessionStateError, SessionStatus, UploadFile, UploadedFile,
};
use quill_storage::{keys, StorageGateway, UploadError};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::report::{CleanupReport, ObjectRef};

#[derive(Debug)]
struct SessionState {
    entity_id: Option<String>,
    status: SessionStatus,
    uploaded_files: Vec<UploadedFile>,
    created_at: DateTime<Utc>,
}

impl SessionState {
    fn new(entity_id: Option<String>, status: SessionStatus) -> Self {
        Self {
            entity_id,
            status,
            uploaded_files: Vec::new(),
            created_at: Utc::now(),
        }
    }

    fn active_entity_id(&self) -> Result<String, SessionStateError> {
        match (&self.entity_id, self.status) {
            (Some(id), SessionStatus::Active) => Ok(id.clone()),
            _ => Err(SessionStateError::NotActive {
                status: self.status,
            }),
        }
    }
}

/// Point-in-time copy of a session's state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub entity_id: Option<String>,
    pub entity_type: EntityType,
    pub mode: SessionMode,
    pub status: SessionStatus,
    pub uploaded_files: Vec<UploadedFile>,
    pub created_at: DateTime<Utc>,
}

/// Upload session owned by one form instance.
///
/// State sits behind a mutex held only for short, synchronous sections, so
/// overlapping uploads always append to the latest file list.
pub struct EntityUploadSession {
    gateway: StorageGateway,
    entity_type: EntityType,
    mode: SessionMode,
    state: Mutex<SessionState>,
}

impl EntityUploadSession {
    /// Create-mode session. Uninitialized until [`Self::initialize_session`].
    pub fn new_create(gateway: StorageGateway, entity_type: EntityType) -> Self {
        Self {
            gateway,
            entity_type,
            mode: SessionMode::Create,
            state: Mutex::new(SessionState::new(None, SessionStatus::Uninitialized)),
        }
    }

    /// Edit-mode session for an already persisted entity. Active immediately.
    pub fn for_edit(
        gateway: StorageGateway,
        entity_type: EntityType,
        existing_id: impl Into<String>,
    ) -> Result<Self, UploadError> {
        let existing_id = existing_id.into();
        if existing_id.is_empty() {
            return Err(SessionStateError::MissingEntityId.into());
        }
        keys::validate_entity_id(&existing_id)?;

        tracing::debug!(
            entity_type = %entity_type,
            entity_id = %existing_id,
            "Edit upload session opened"
        );

        Ok(Self {
            gateway,
            entity_type,
            mode: SessionMode::Edit,
            state: Mutex::new(SessionState::new(Some(existing_id), SessionStatus::Active)),
        })
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint the entity id and activate the session.
    ///
    /// Calling it again while active returns the existing id. A finished
    /// session can't be reactivated.
    pub fn initialize_session(&self) -> Result<String, SessionStateError> {
        let mut state = self.state();
        match state.status {
            SessionStatus::Active => {
                let id = state.active_entity_id()?;
                if self.mode == SessionMode::Create {
                    tracing::warn!(
                        entity_type = %self.entity_type,
                        entity_id = %id,
                        "Upload session already initialized, reusing entity id"
                    );
                }
                Ok(id)
            }
            SessionStatus::Uninitialized => {
                let id = keys::generate_id();
                state.entity_id = Some(id.clone());
                state.status = SessionStatus::Active;
                tracing::info!(
                    entity_type = %self.entity_type,
                    entity_id = %id,
                    "Upload session initialized"
                );
                Ok(id)
            }
            status => Err(SessionStateError::NotActive { status }),
        }
    }

    /// Upload a file straight to its final location and record it.
    #[tracing::instrument(
        skip(self, file),
        fields(entity_type = %self.entity_type, mode = %self.mode, file_name = %file.name)
    )]
    pub async fn upload_direct(
        &self,
        file: &UploadFile,
        role: FileRole,
    ) -> Result<UploadedFile, UploadError> {
        let entity_id = self.state().active_entity_id().inspect_err(|e| {
            tracing::warn!(error = %e, "Upload attempted without an active session");
        })?;

        let (entry, stored) = self
            .gateway
            .upload_for_entity(self.entity_type, &entity_id, role, file)
            .await?;

        let record = UploadedFile {
            bucket: entry.bucket,
            final_path: stored.path,
            file_type: role,
            original_name: file.name.clone(),
            url: stored.url,
            uploaded_at: Utc::now(),
        };

        let closed_as = {
            let mut state = self.state();
            if state.status == SessionStatus::Active {
                state.uploaded_files.push(record.clone());
                None
            } else {
                Some(state.status)
            }
        };

        if let Some(status) = closed_as {
            self.discard_late_upload(&record, status).await;
            return Err(SessionStateError::ClosedDuringUpload { status }.into());
        }

        tracing::info!(
            entity_id = %entity_id,
            bucket = %record.bucket,
            path = %record.final_path,
            "Upload recorded in session"
        );

        Ok(record)
    }

    /// An upload that lands after a create session was cleaned up would
    /// survive the folder delete; remove it so cancelling stays leak-free.
    async fn discard_late_upload(&self, record: &UploadedFile, status: SessionStatus) {
        if self.mode == SessionMode::Create && status == SessionStatus::CleanedUp {
            match self.gateway.delete(record.bucket, &record.final_path).await {
                Ok(()) => tracing::info!(
                    bucket = %record.bucket,
                    path = %record.final_path,
                    "Deleted upload that finished after cleanup"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    bucket = %record.bucket,
                    path = %record.final_path,
                    "Failed to delete upload that finished after cleanup"
                ),
            }
        } else {
            tracing::warn!(
                status = %status,
                bucket = %record.bucket,
                path = %record.final_path,
                "Upload finished after the session closed; object left in storage"
            );
        }
    }

    /// Delete one file this session uploaded and stop tracking it.
    ///
    /// Returns `false` without touching storage when `url` isn't tracked.
    #[tracing::instrument(skip(self), fields(entity_type = %self.entity_type, mode = %self.mode))]
    pub async fn remove_upload(&self, url: &str) -> Result<bool, UploadError> {
        let target = {
            let state = self.state();
            if state.status != SessionStatus::Active {
                return Err(SessionStateError::NotActive {
                    status: state.status,
                }
                .into());
            }
            state.uploaded_files.iter().find(|f| f.url == url).cloned()
        };

        let Some(target) = target else {
            tracing::warn!(url = %url, "File is not tracked by this session, nothing removed");
            return Ok(false);
        };

        self.gateway
            .delete(target.bucket, &target.final_path)
            .await?;

        self.state().uploaded_files.retain(|f| f.url != url);

        tracing::info!(
            bucket = %target.bucket,
            path = %target.final_path,
            "Removed upload from session"
        );

        Ok(true)
    }

    /// Mark a create session committed and hand back its files.
    ///
    /// No storage call; the files are already in place. On an edit session
    /// this is a usage error: it is logged and `None` is returned.
    pub fn commit_create(&self) -> Option<Vec<UploadedFile>> {
        self.commit_as(SessionMode::Create, "commit_create")
    }

    /// Edit-mode counterpart of [`Self::commit_create`].
    pub fn commit_edit(&self) -> Option<Vec<UploadedFile>> {
        self.commit_as(SessionMode::Edit, "commit_edit")
    }

    fn commit_as(&self, mode: SessionMode, operation: &'static str) -> Option<Vec<UploadedFile>> {
        if self.mode != mode {
            let e = SessionStateError::InvalidMode {
                operation,
                mode: self.mode,
            };
            tracing::warn!(error = %e, entity_type = %self.entity_type, "Session usage error");
            return None;
        }

        let mut state = self.state();
        if state.status != SessionStatus::Active {
            let e = SessionStateError::NotActive {
                status: state.status,
            };
            tracing::warn!(error = %e, entity_type = %self.entity_type, "Session usage error");
            return None;
        }

        state.status = SessionStatus::Committed;
        let files = std::mem::take(&mut state.uploaded_files);

        tracing::info!(
            entity_type = %self.entity_type,
            entity_id = ?state.entity_id,
            files = files.len(),
            "Upload session committed"
        );

        Some(files)
    }

    /// End the session on cancel. Never fails.
    ///
    /// A create session with uploads has its whole entity folder deleted, in
    /// every bucket the entity type uses. An edit session never touches
    /// storage; its uploads are reported as orphaned.
    #[tracing::instrument(skip(self), fields(entity_type = %self.entity_type, mode = %self.mode))]
    pub async fn cleanup(&self) -> CleanupReport {
        let (previous, entity_id, files) = {
            let mut state = self.state();
            let previous = state.status;
            if previous.is_terminal() {
                tracing::debug!(status = %previous, "Session already finished, nothing to clean up");
                return CleanupReport::default();
            }
            state.status = SessionStatus::CleanedUp;
            (
                previous,
                state.entity_id.take(),
                std::mem::take(&mut state.uploaded_files),
            )
        };

        let mut report = CleanupReport::default();
        let Some(entity_id) = entity_id.filter(|_| previous == SessionStatus::Active) else {
            return report;
        };

        match self.mode {
            SessionMode::Edit => {
                report.orphaned = files.iter().map(ObjectRef::from).collect();
                if !report.orphaned.is_empty() {
                    tracing::warn!(
                        entity_id = %entity_id,
                        orphaned = report.orphaned.len(),
                        "Edit session cancelled, its uploads stay in storage for the orphan sweep"
                    );
                }
            }
            SessionMode::Create if files.is_empty() => {
                tracing::debug!(entity_id = %entity_id, "Create session cancelled before any upload");
            }
            SessionMode::Create => {
                match self
                    .gateway
                    .delete_entity_folders(self.entity_type, &entity_id)
                    .await
                {
                    Ok(removed) => {
                        report.deleted_folders.push(keys::entity_prefix(&entity_id));
                        report.deleted_objects = removed;
                        tracing::info!(
                            entity_id = %entity_id,
                            removed,
                            "Deleted folder of abandoned create session"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            entity_id = %entity_id,
                            "Failed to delete folder of abandoned create session"
                        );
                        report.failures.push(e.to_string());
                        report.orphaned = files.iter().map(ObjectRef::from).collect();
                    }
                }
            }
        }

        report
    }

    /// Drop all in-memory state without touching storage.
    pub fn reset(&self) {
        let mut state = self.state();
        let previous = state.status;
        if !previous.is_terminal() {
            state.status = SessionStatus::Discarded;
        }
        state.entity_id = None;
        let dropped = std::mem::take(&mut state.uploaded_files);

        if previous == SessionStatus::Active && !dropped.is_empty() {
            tracing::warn!(
                entity_type = %self.entity_type,
                mode = %self.mode,
                files = dropped.len(),
                "Upload session reset with tracked files; they stay in storage"
            );
        } else {
            tracing::debug!(entity_type = %self.entity_type, "Upload session reset");
        }
    }

    pub fn entity_id(&self) -> Option<String> {
        self.state().entity_id.clone()
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.state().status
    }

    pub fn is_active(&self) -> bool {
        self.status() == SessionStatus::Active
    }

    pub fn uploaded_files(&self) -> Vec<UploadedFile> {
        self.state().uploaded_files.clone()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.state().created_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            entity_id: state.entity_id.clone(),
            entity_type: self.entity_type,
            mode: self.mode,
            status: state.status,
            uploaded_files: state.uploaded_files.clone(),
            created_at: state.created_at,
        }
    }
}
