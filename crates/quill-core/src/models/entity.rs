use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Database-backed business object that can own stored images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Article,
    Author,
    Brief,
    Company,
    BullRoom,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Article => "article",
            EntityType::Author => "author",
            EntityType::Brief => "brief",
            EntityType::Company => "company",
            EntityType::BullRoom => "bullroom",
        }
    }
}

impl FromStr for EntityType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "article" => Ok(EntityType::Article),
            "author" => Ok(EntityType::Author),
            "brief" => Ok(EntityType::Brief),
            "company" => Ok(EntityType::Company),
            "bullroom" | "bull-room" | "bull_room" => Ok(EntityType::BullRoom),
            _ => Err(anyhow::anyhow!("Invalid entity type: {}", s)),
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Role of a file within its entity (e.g. avatar vs banner for an author).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Primary,
    Secondary,
    Tertiary,
}

impl FromStr for FileRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(FileRole::Primary),
            "secondary" => Ok(FileRole::Secondary),
            "tertiary" => Ok(FileRole::Tertiary),
            _ => Err(anyhow::anyhow!("Invalid file role: {}", s)),
        }
    }
}

impl Display for FileRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileRole::Primary => write!(f, "primary"),
            FileRole::Secondary => write!(f, "secondary"),
            FileRole::Tertiary => write!(f, "tertiary"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Create,
    Edit,
}

impl Display for SessionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionMode::Create => write!(f, "create"),
            SessionMode::Edit => write!(f, "edit"),
        }
    }
}

/// Lifecycle of an entity upload session.
///
/// `Uninitialized → Active → {Committed, CleanedUp, Discarded}`. No terminal
/// state ever returns to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Uninitialized,
    Active,
    Committed,
    CleanedUp,
    /// Dropped through `reset()` without touching storage.
    Discarded,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Committed | SessionStatus::CleanedUp | SessionStatus::Discarded
        )
    }
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SessionStatus::Uninitialized => write!(f, "uninitialized"),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Committed => write!(f, "committed"),
            SessionStatus::CleanedUp => write!(f, "cleaned_up"),
            SessionStatus::Discarded => write!(f, "discarded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_accepts_bull_room_spellings() {
        assert_eq!("bull-room".parse::<EntityType>().unwrap(), EntityType::BullRoom);
        assert_eq!("BullRoom".parse::<EntityType>().unwrap(), EntityType::BullRoom);
        assert!("video".parse::<EntityType>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionStatus::Uninitialized.is_terminal());
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Committed.is_terminal());
        assert!(SessionStatus::CleanedUp.is_terminal());
        assert!(SessionStatus::Discarded.is_terminal());
    }

    #[test]
    fn file_role_serializes_lowercase() {
        let json = serde_json::to_string(&FileRole::Secondary).unwrap();
        assert_eq!(json, "\"secondary\"");
    }
}
