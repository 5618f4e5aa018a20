use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::FileRole;
use crate::storage_types::Bucket;

/// A file selected by the user, held in memory until it is uploaded.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A file stored at its final location during an entity upload session.
///
/// `url` and `final_path` are what the entity CRUD layer persists onto the
/// entity row; this subsystem never writes that row itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub bucket: Bucket,
    pub final_path: String,
    pub file_type: FileRole,
    pub original_name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}
