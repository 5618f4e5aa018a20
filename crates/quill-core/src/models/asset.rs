use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const MB: usize = 1024 * 1024;

/// Content types accepted by every asset class.
pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Validation class of an uploaded asset.
///
/// Each class carries its own size ceiling and MIME allow-list. Recommended
/// dimensions are advisory and never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    AuthorAvatar,
    AuthorBanner,
    FeaturedImage,
    ArticleImage,
    BriefImage,
    CompanyLogo,
    BullRoomFile,
}

impl AssetClass {
    pub fn max_bytes(&self) -> usize {
        match self {
            AssetClass::AuthorAvatar | AssetClass::CompanyLogo => 2 * MB,
            AssetClass::ArticleImage => 5 * MB,
            AssetClass::AuthorBanner
            | AssetClass::FeaturedImage
            | AssetClass::BriefImage
            | AssetClass::BullRoomFile => 10 * MB,
        }
    }

    pub fn allowed_content_types(&self) -> &'static [&'static str] {
        IMAGE_CONTENT_TYPES
    }

    /// Recommended (width, height) in pixels.
    pub fn recommended_dimensions(&self) -> (u32, u32) {
        match self {
            AssetClass::AuthorAvatar | AssetClass::CompanyLogo => (400, 400),
            AssetClass::AuthorBanner => (1500, 500),
            AssetClass::FeaturedImage
            | AssetClass::ArticleImage
            | AssetClass::BriefImage
            | AssetClass::BullRoomFile => (1920, 1080),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::AuthorAvatar => "author_avatar",
            AssetClass::AuthorBanner => "author_banner",
            AssetClass::FeaturedImage => "featured_image",
            AssetClass::ArticleImage => "article_image",
            AssetClass::BriefImage => "brief_image",
            AssetClass::CompanyLogo => "company_logo",
            AssetClass::BullRoomFile => "bull_room_file",
        }
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "author_avatar" | "avatar" => Ok(AssetClass::AuthorAvatar),
            "author_banner" | "banner" => Ok(AssetClass::AuthorBanner),
            "featured_image" | "featured" => Ok(AssetClass::FeaturedImage),
            "article_image" | "inline" => Ok(AssetClass::ArticleImage),
            "brief_image" | "brief" => Ok(AssetClass::BriefImage),
            "company_logo" | "logo" => Ok(AssetClass::CompanyLogo),
            "bull_room_file" => Ok(AssetClass::BullRoomFile),
            _ => Err(anyhow::anyhow!("Invalid asset class: {}", s)),
        }
    }
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
