//! Domain models for upload sessions.

pub mod asset;
pub mod entity;
pub mod upload;

pub use asset::AssetClass;
pub use entity::{EntityType, FileRole, SessionMode, SessionStatus};
pub use upload::{UploadFile, UploadedFile};
