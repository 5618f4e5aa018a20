//! Path policy
//!
//! Pure mapping from (entity type, file role) to the bucket, file-name prefix
//! and asset class an upload uses, plus the path builders for the permanent
//! and temporary namespaces.

use quill_core::{
    AssetClass, AssetValidator, Bucket, EntityType, FileRole, UploadFile, ValidationError,
    ValidationResult,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::keys;

/// Where and how one kind of entity file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyEntry {
    pub bucket: Bucket,
    pub role_prefix: &'static str,
    pub asset_class: AssetClass,
}

const fn entry(bucket: Bucket, role_prefix: &'static str, asset_class: AssetClass) -> PolicyEntry {
    PolicyEntry {
        bucket,
        role_prefix,
        asset_class,
    }
}

/// Asset kinds staged by the temporary-session flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempAsset {
    FeaturedImage,
    AuthorAvatar,
    AuthorBanner,
    CompanyLogo,
}

impl TempAsset {
    pub fn entry(&self) -> PolicyEntry {
        match self {
            TempAsset::FeaturedImage => {
                entry(Bucket::FeaturedImages, "featured", AssetClass::FeaturedImage)
            }
            TempAsset::AuthorAvatar => {
                entry(Bucket::AuthorAvatars, "avatar", AssetClass::AuthorAvatar)
            }
            TempAsset::AuthorBanner => {
                entry(Bucket::AuthorBanners, "banner", AssetClass::AuthorBanner)
            }
            TempAsset::CompanyLogo => entry(Bucket::CompanyLogos, "logo", AssetClass::CompanyLogo),
        }
    }
}

impl FromStr for TempAsset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "featured_image" | "featured" => Ok(TempAsset::FeaturedImage),
            "author_avatar" | "avatar" => Ok(TempAsset::AuthorAvatar),
            "author_banner" | "banner" => Ok(TempAsset::AuthorBanner),
            "company_logo" | "logo" => Ok(TempAsset::CompanyLogo),
            _ => Err(format!("Invalid temporary asset: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathPolicy;

impl PathPolicy {
    pub fn new() -> Self {
        PathPolicy
    }

    /// Storage rules for a role of an entity type.
    pub fn entry(
        &self,
        entity_type: EntityType,
        role: FileRole,
    ) -> Result<PolicyEntry, ValidationError> {
        use AssetClass as A;
        use Bucket as B;

        let found = match (entity_type, role) {
            (EntityType::Article, FileRole::Primary) => {
                Some(entry(B::ArticleImages, "featured", A::FeaturedImage))
            }
            (EntityType::Article, FileRole::Secondary) => {
                Some(entry(B::ArticleImages, "inline", A::ArticleImage))
            }
            (EntityType::Article, FileRole::Tertiary) => {
                Some(entry(B::ArticleImages, "social", A::FeaturedImage))
            }
            (EntityType::Brief, FileRole::Primary) => {
                Some(entry(B::ArticleImages, "brief", A::BriefImage))
            }
            (EntityType::Author, FileRole::Primary) => {
                Some(entry(B::AuthorAvatars, "avatar", A::AuthorAvatar))
            }
            (EntityType::Author, FileRole::Secondary) => {
                Some(entry(B::AuthorBanners, "banner", A::AuthorBanner))
            }
            (EntityType::Company, FileRole::Primary) => {
                Some(entry(B::CompanyLogos, "logo", A::CompanyLogo))
            }
            (EntityType::BullRoom, FileRole::Primary) => {
                Some(entry(B::BullRoomFiles, "file", A::BullRoomFile))
            }
            _ => None,
        };

        found.ok_or(ValidationError::UnsupportedRole { entity_type, role })
    }

    /// Distinct buckets an entity type writes to, in a stable order.
    pub fn buckets_for(&self, entity_type: EntityType) -> Vec<Bucket> {
        let mut buckets: Vec<Bucket> = [FileRole::Primary, FileRole::Secondary, FileRole::Tertiary]
            .into_iter()
            .filter_map(|role| self.entry(entity_type, role).ok())
            .map(|e| e.bucket)
            .collect();
        buckets.sort();
        buckets.dedup();
        buckets
    }

    /// Check a file against an asset class. Never fails; see [`ValidationResult`].
    pub fn validate(&self, file: &UploadFile, asset_class: AssetClass) -> ValidationResult {
        AssetValidator::new(asset_class).validate(file)
    }

    /// Permanent path `{entity_id}/{prefix}-{millis}-{token}.{ext}` for a new upload.
    pub fn build_path(
        &self,
        entity_type: EntityType,
        entity_id: &str,
        role: FileRole,
        original_name: &str,
        content_type: &str,
    ) -> Result<(PolicyEntry, String), ValidationError> {
        keys::validate_entity_id(entity_id)?;
        let entry = self.entry(entity_type, role)?;
        let file_name = keys::generate_file_name(entry.role_prefix, original_name, content_type)?;
        Ok((entry, format!("{}{}", keys::entity_prefix(entity_id), file_name)))
    }

    /// Temporary path `temp/{session_id}/{prefix}-{millis}-{token}.{ext}`.
    pub fn build_temp_path(
        &self,
        session_id: &str,
        asset: TempAsset,
        original_name: &str,
        content_type: &str,
    ) -> Result<String, ValidationError> {
        let entry = asset.entry();
        let file_name = keys::generate_file_name(entry.role_prefix, original_name, content_type)?;
        Ok(format!("{}{}", keys::temp_prefix(session_id), file_name))
    }

    /// Permanent destination of a temporary object: `{entity_id}/{file_name}`.
    pub fn permanent_path_for(
        &self,
        temp_path: &str,
        entity_id: &str,
    ) -> Result<String, ValidationError> {
        keys::validate_entity_id(entity_id)?;
        let file_name = keys::file_name_of(temp_path);
        if !keys::is_temp_path(temp_path) || file_name.is_empty() {
            return Err(ValidationError::InvalidFilename(temp_path.to_string()));
        }
        Ok(format!("{}{}", keys::entity_prefix(entity_id), file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_files_span_two_buckets() {
        let policy = PathPolicy::new();
        assert_eq!(
            policy.buckets_for(EntityType::Author),
            vec![Bucket::AuthorAvatars, Bucket::AuthorBanners]
        );
        assert_eq!(
            policy.buckets_for(EntityType::Article),
            vec![Bucket::ArticleImages]
        );
    }

    #[test]
    fn briefs_share_the_article_bucket() {
        let policy = PathPolicy::new();
        let brief = policy.entry(EntityType::Brief, FileRole::Primary).unwrap();
        let article = policy.entry(EntityType::Article, FileRole::Primary).unwrap();
        assert_eq!(brief.bucket, article.bucket);
        assert_ne!(brief.role_prefix, article.role_prefix);
    }

    #[test]
    fn unsupported_role_is_a_validation_error() {
        let policy = PathPolicy::new();
        assert_eq!(
            policy.entry(EntityType::Company, FileRole::Secondary),
            Err(ValidationError::UnsupportedRole {
                entity_type: EntityType::Company,
                role: FileRole::Secondary,
            })
        );
    }

    #[test]
    fn build_path_is_entity_prefixed() {
        let policy = PathPolicy::new();
        let (entry, path) = policy
            .build_path(EntityType::Author, "a1", FileRole::Secondary, "wide.webp", "image/webp")
            .unwrap();
        assert_eq!(entry.bucket, Bucket::AuthorBanners);
        assert!(path.starts_with("a1/banner-"));
        assert!(path.ends_with(".webp"));
    }

    #[test]
    fn build_path_rejects_temp_entity_id() {
        let policy = PathPolicy::new();
        assert!(policy
            .build_path(EntityType::Article, "temp", FileRole::Primary, "a.png", "image/png")
            .is_err());
    }

    #[test]
    fn temp_and_permanent_paths() {
        let policy = PathPolicy::new();
        let temp = policy
            .build_temp_path("s1", TempAsset::FeaturedImage, "hero.jpg", "image/jpeg")
            .unwrap();
        assert!(temp.starts_with("temp/s1/featured-"));

        let permanent = policy.permanent_path_for(&temp, "article-9").unwrap();
        assert_eq!(
            permanent,
            format!("article-9/{}", temp.trim_start_matches("temp/s1/"))
        );
        assert!(policy
            .permanent_path_for("article-1/featured-1-x.jpg", "article-9")
            .is_err());
    }

    #[test]
    fn validate_uses_asset_class_limits() {
        let policy = PathPolicy::new();
        let file = UploadFile::new("logo.png", "image/png", vec![1u8; 3 * 1024 * 1024]);
        assert!(!policy.validate(&file, AssetClass::CompanyLogo).valid);
        assert!(policy.validate(&file, AssetClass::FeaturedImage).valid);
    }
}
