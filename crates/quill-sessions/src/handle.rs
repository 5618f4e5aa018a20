use quill_core::{
    EntityType, FileRole, SessionMode, SessionStateError, SessionStatus, UploadFile, UploadedFile,
};
use quill_storage::{StorageGateway, UploadError};
use std::sync::Arc;

use crate::entity_session::EntityUploadSession;
use crate::report::CleanupReport;

/// Open an upload session for one form.
///
/// A create session is initialized right away so its entity id exists before
/// the first upload. An edit session needs the id of the persisted entity.
pub fn open_session(
    gateway: StorageGateway,
    entity_type: EntityType,
    mode: SessionMode,
    existing_id: Option<&str>,
) -> Result<SessionHandle, UploadError> {
    let session = match mode {
        SessionMode::Create => {
            if let Some(id) = existing_id {
                tracing::warn!(
                    existing_id = %id,
                    "Create sessions mint their own entity id, ignoring the supplied one"
                );
            }
            let session = EntityUploadSession::new_create(gateway, entity_type);
            session.initialize_session()?;
            session
        }
        SessionMode::Edit => {
            let id = existing_id.ok_or(SessionStateError::MissingEntityId)?;
            EntityUploadSession::for_edit(gateway, entity_type, id)?
        }
    };

    Ok(SessionHandle {
        session: Arc::new(session),
    })
}

/// Cheap, cloneable handle to a session opened by [`open_session`].
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<EntityUploadSession>,
}

impl SessionHandle {
    pub fn session(&self) -> &EntityUploadSession {
        &self.session
    }

    pub fn entity_id(&self) -> Option<String> {
        self.session.entity_id()
    }

    pub fn mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub async fn upload(
        &self,
        file: &UploadFile,
        role: FileRole,
    ) -> Result<UploadedFile, UploadError> {
        self.session.upload_direct(file, role).await
    }

    pub async fn remove(&self, url: &str) -> Result<bool, UploadError> {
        self.session.remove_upload(url).await
    }

    /// Commit using the operation that matches the session's mode.
    pub fn commit(&self) -> Option<Vec<UploadedFile>> {
        match self.session.mode() {
            SessionMode::Create => self.session.commit_create(),
            SessionMode::Edit => self.session.commit_edit(),
        }
    }

    pub async fn cleanup(&self) -> CleanupReport {
        self.session.cleanup().await
    }

    /// Close without committing or cleaning up storage.
    pub fn close(&self) {
        self.session.reset();
    }
}
