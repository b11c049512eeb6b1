//! # tally-entity
//!
//! Domain entities for Tally: the shared counter room, its participants,
//! append-only count events, and the locally persisted session record.

pub mod event;
pub mod participant;
pub mod room;
pub mod session;

pub use event::CountEvent;
pub use participant::{Participant, PresenceStatus};
pub use room::{Direction, Room};
pub use session::StoredSession;
