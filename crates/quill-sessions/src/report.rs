use quill_core::{Bucket, UploadedFile};
use serde::{Deserialize, Serialize};

/// A single stored object, identified by bucket and bucket-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: Bucket,
    pub path: String,
}

impl ObjectRef {
    pub fn new(bucket: Bucket, path: impl Into<String>) -> Self {
        Self {
            bucket,
            path: path.into(),
        }
    }
}

impl From<&UploadedFile> for ObjectRef {
    fn from(file: &UploadedFile) -> Self {
        Self::new(file.bucket, file.final_path.clone())
    }
}

/// Outcome of a best-effort cleanup.
///
/// Cleanup never fails; whatever could not be removed shows up here and in the
/// logs instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Folder prefixes removed as a whole, e.g. `{entity_id}/`.
    pub deleted_folders: Vec<String>,
    pub deleted_objects: usize,
    /// Objects knowingly left in storage.
    pub orphaned: Vec<ObjectRef>,
    pub failures: Vec<String>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty() && self.failures.is_empty()
    }
}
