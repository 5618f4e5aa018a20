//! Shared path generation for storage backends.
//!
//! Permanent paths are rooted at `{entity_id}/`, temporary paths at
//! `temp/{session_id}/`. Entity ids equal to `temp` are rejected so the two
//! namespaces never overlap.

use chrono::Utc;
use quill_core::validation::extension_for_content_type;
use quill_core::{Bucket, ValidationError};
use rand::Rng;
use std::path::Path;

use crate::traits::{StorageError, StorageResult};

/// Root segment of the temporary namespace.
pub const TEMP_ROOT: &str = "temp";

const TOKEN_LENGTH: usize = 8;
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Folder holding every object of one entity.
pub fn entity_prefix(entity_id: &str) -> String {
    format!("{}/", entity_id)
}

/// Folder holding every object of one temporary session.
pub fn temp_prefix(session_id: &str) -> String {
    format!("{}/{}/", TEMP_ROOT, session_id)
}

pub fn is_temp_path(path: &str) -> bool {
    path.starts_with(&format!("{}/", TEMP_ROOT))
}

/// Fresh identifier for a new entity or temporary session.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Reject ids that would escape their folder or land in the temporary namespace.
pub fn validate_entity_id(entity_id: &str) -> Result<(), ValidationError> {
    let trimmed = entity_id.trim();
    if trimmed.is_empty()
        || trimmed != entity_id
        || entity_id.contains('/')
        || entity_id.contains("..")
        || entity_id == TEMP_ROOT
    {
        return Err(ValidationError::InvalidEntityId(entity_id.to_string()));
    }
    Ok(())
}

/// Generate a collision-resistant file name:
/// `{role_prefix}-{unix_millis}-{token}.{ext}`.
pub fn generate_file_name(
    role_prefix: &str,
    original_name: &str,
    content_type: &str,
) -> Result<String, ValidationError> {
    let extension = file_extension(original_name, content_type)?;
    let mut rng = rand::rng();
    let token: String = (0..TOKEN_LENGTH)
        .map(|_| char::from(TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())]))
        .collect();

    Ok(format!(
        "{}-{}-{}.{}",
        role_prefix,
        Utc::now().timestamp_millis(),
        token,
        extension
    ))
}

/// `{base}/{bucket}/{path}` with the path percent-encoded.
///
/// A base ending in `/` (including scheme-only bases like `memory://`) is
/// joined without adding another separator.
pub fn object_url(base: &str, bucket: Bucket, path: &str) -> String {
    let separator = if base.ends_with('/') { "" } else { "/" };
    format!("{}{}{}/{}", base, separator, bucket, encode_path(path))
}

/// Lowercased extension of the original name, or the one implied by the content type.
pub fn file_extension(original_name: &str, content_type: &str) -> Result<String, ValidationError> {
    let from_name = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()));

    match from_name {
        Some(ext) => Ok(ext),
        None => extension_for_content_type(content_type)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::InvalidFilename(original_name.to_string())),
    }
}

/// Last path segment.
pub fn file_name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Content type to use when re-uploading an object whose original type is unknown.
pub fn content_type_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Validate a bucket-relative object path.
pub fn validate_key(path: &str) -> StorageResult<()> {
    if path.is_empty() || path.contains("..") || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            path
        )));
    }
    Ok(())
}

/// Percent-encode each path segment for use in a URL.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        assert_eq!(entity_prefix("abc"), "abc/");
        assert_eq!(temp_prefix("s1"), "temp/s1/");
        assert!(is_temp_path("temp/s1/featured-1-x.png"));
        assert!(!is_temp_path("temporary/x.png"));
        assert!(!is_temp_path("abc/featured-1-x.png"));
    }

    #[test]
    fn entity_id_cannot_enter_temp_namespace() {
        assert!(validate_entity_id("temp").is_err());
        assert!(validate_entity_id("").is_err());
        assert!(validate_entity_id("a/b").is_err());
        assert!(validate_entity_id("..").is_err());
        assert!(validate_entity_id(" padded").is_err());
        assert!(validate_entity_id(&generate_id()).is_ok());
    }

    #[test]
    fn file_name_shape() {
        let name = generate_file_name("avatar", "Me.PNG", "image/png").unwrap();
        let parts: Vec<&str> = name.splitn(3, '-').collect();
        assert_eq!(parts[0], "avatar");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].ends_with(".png"));
        assert_eq!(parts[2].len(), TOKEN_LENGTH + ".png".len());
    }

    #[test]
    fn file_name_token_is_lowercase_alphanumeric() {
        for _ in 0..50 {
            let name = generate_file_name("logo", "a.png", "image/png").unwrap();
            let token = name.rsplit('-').next().unwrap().trim_end_matches(".png");
            assert_eq!(token.len(), TOKEN_LENGTH);
            assert!(token
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn object_url_joins_base() {
        assert_eq!(
            object_url("memory://", Bucket::CompanyLogos, "c1/logo.png"),
            "memory://company-logos/c1/logo.png"
        );
        assert_eq!(
            object_url("http://localhost:4000/storage/", Bucket::CompanyLogos, "c1/a b.png"),
            "http://localhost:4000/storage/company-logos/c1/a%20b.png"
        );
        assert_eq!(
            object_url("http://localhost:4000/storage", Bucket::AuthorAvatars, "a/x.png"),
            "http://localhost:4000/storage/author-avatars/a/x.png"
        );
    }

    #[test]
    fn file_names_are_distinct() {
        let a = generate_file_name("featured", "a.jpg", "image/jpeg").unwrap();
        let b = generate_file_name("featured", "a.jpg", "image/jpeg").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(file_extension("pasted", "image/webp").unwrap(), "webp");
        assert_eq!(file_extension("photo.JPEG", "image/jpeg").unwrap(), "jpeg");
        assert!(file_extension("pasted", "application/pdf").is_err());
    }

    #[test]
    fn key_validation() {
        assert!(validate_key("abc/logo-1-x.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn encode_path_keeps_separators() {
        assert_eq!(encode_path("a b/c.png"), "a%20b/c.png");
        assert_eq!(file_name_of("temp/s/x.png"), "x.png");
        assert_eq!(content_type_for_path("a/b.JPG"), "image/jpeg");
    }
}
