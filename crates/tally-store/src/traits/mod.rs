//! Collaborator traits consumed by the synchronization engine.

pub mod store;
pub mod vault;

pub use store::{EventLog, ParticipantStore, RoomStore};
pub use vault::SessionVault;
