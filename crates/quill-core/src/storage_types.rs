use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// This enum defines the available storage backend types.
/// It's defined in core because it's used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Object-storage buckets.
///
/// The namespace is fixed: buckets are provisioned out-of-band and never
/// created by this system. `article-images` is shared by articles and briefs;
/// their objects are told apart by the entity-id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bucket {
    ArticleImages,
    AuthorAvatars,
    AuthorBanners,
    FeaturedImages,
    CompanyLogos,
    BullRoomFiles,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::ArticleImages,
        Bucket::AuthorAvatars,
        Bucket::AuthorBanners,
        Bucket::FeaturedImages,
        Bucket::CompanyLogos,
        Bucket::BullRoomFiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::ArticleImages => "article-images",
            Bucket::AuthorAvatars => "author-avatars",
            Bucket::AuthorBanners => "author-banners",
            Bucket::FeaturedImages => "featured-images",
            Bucket::CompanyLogos => "company-logos",
            Bucket::BullRoomFiles => "bull-room-files",
        }
    }
}

impl FromStr for Bucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown bucket: {}", s))
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_round_trip_through_from_str() {
        for bucket in Bucket::ALL {
            assert_eq!(bucket.as_str().parse::<Bucket>().unwrap(), bucket);
        }
        assert!("avatars".parse::<Bucket>().is_err());
    }

    #[test]
    fn storage_backend_parse_is_case_insensitive() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("nfs".parse::<StorageBackend>().is_err());
    }
}
