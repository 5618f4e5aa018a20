//! Quill Sessions Library
//!
//! Upload sessions that tie files picked in a create or edit form to the
//! entity that will own them.
//!
//! - [`EntityUploadSession`] uploads straight into the entity folder. Create
//!   sessions mint the entity id up front; cancelling deletes the folder.
//!   Edit sessions never delete on cancel.
//! - [`TemporarySession`] stages files under `temp/{session_id}/` and moves
//!   them once the entity id is known.

pub mod entity_session;
pub mod handle;
pub mod report;
pub mod temp_session;

pub use entity_session::{EntityUploadSession, SessionSnapshot};
pub use handle::{open_session, SessionHandle};
pub use report::{CleanupReport, ObjectRef};
pub use temp_session::TemporarySession;
