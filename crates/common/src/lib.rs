//! Shared types for the pill dispenser registration flow
//!
//! Defines the inbound registration payload, the reduced record persisted for
//! the dispenser, and the identifier scheme used to name record files.

pub mod error;
pub mod identifier;
pub mod record;

pub use error::{Error, Result};
pub use identifier::UserId;
pub use record::{PersistedRecord, RegistrationPayload, ScheduleEntry, UserInfo};
