//! Asset validation
//!
//! Checks an [`UploadFile`] against the MIME allow-list and size ceiling of an
//! [`AssetClass`]. Validation runs before any network call.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::{AssetClass, EntityType, FileRole, UploadFile};

/// Extensions accepted for image assets, with the content types they imply.
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Validation errors for uploaded assets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid file extension: {extension} (allowed: jpg, jpeg, png, webp)")]
    InvalidExtension { extension: String },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("File role {role} is not supported for entity type {entity_type}")]
    UnsupportedRole {
        entity_type: EntityType,
        role: FileRole,
    },

    #[error("Invalid entity id: {0}")]
    InvalidEntityId(String),
}

/// Outcome of [`AssetValidator::validate`]; never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: &ValidationError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

/// Validator for one asset class.
pub struct AssetValidator {
    asset_class: AssetClass,
}

impl AssetValidator {
    pub fn new(asset_class: AssetClass) -> Self {
        Self { asset_class }
    }

    pub fn asset_class(&self) -> AssetClass {
        self.asset_class
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        let max = self.asset_class.max_bytes();
        if size > max {
            return Err(ValidationError::FileTooLarge { size, max });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();
        let allowed = self.asset_class.allowed_content_types();

        if !allowed.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: allowed.iter().map(|ct| ct.to_string()).collect(),
            });
        }

        Ok(())
    }

    /// Validate that the file extension, when present, agrees with the content type.
    ///
    /// A name without an extension is accepted; the stored name then takes its
    /// extension from the content type.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let base = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        let Some(extension) = Path::new(base)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
        else {
            return Ok(());
        };

        let expected = IMAGE_EXTENSIONS
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, ct)| *ct)
            .ok_or_else(|| ValidationError::InvalidExtension {
                extension: extension.clone(),
            })?;

        let normalized = content_type.trim().to_lowercase();
        if expected != normalized {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected: {})",
                    content_type, extension, expected
                ),
                allowed: self
                    .asset_class
                    .allowed_content_types()
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file, including Content-Type/extension matching
    pub fn validate_all(&self, file: &UploadFile) -> Result<(), ValidationError> {
        self.validate_file_size(file.size())?;
        self.validate_content_type(&file.content_type)?;
        self.validate_extension_content_type_match(&file.name, &file.content_type)?;
        Ok(())
    }

    /// Structured form of [`validate_all`](Self::validate_all).
    pub fn validate(&self, file: &UploadFile) -> ValidationResult {
        match self.validate_all(file) {
            Ok(()) => ValidationResult::ok(),
            Err(e) => {
                tracing::debug!(
                    asset_class = %self.asset_class,
                    file_name = %file.name,
                    size_bytes = file.size(),
                    error = %e,
                    "Asset validation failed"
                );
                ValidationResult::invalid(&e)
            }
        }
    }
}

/// Extension implied by an accepted content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_lowercase().as_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
