//! Participant domain entities.

pub mod model;
pub mod status;

pub use model::Participant;
pub use status::PresenceStatus;
