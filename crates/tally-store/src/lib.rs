//! # tally-store
//!
//! The persistence-and-subscription collaborator surface for Tally.
//!
//! The synchronization engine treats the backend as opaque: it only ever
//! talks to the [`traits::RoomStore`], [`traits::ParticipantStore`],
//! [`traits::EventLog`], and [`traits::SessionVault`] seams defined here.
//! [`MemoryStore`] is the single-node reference implementation backing the
//! simulation binary and the test suite.

pub mod memory;
pub mod traits;
pub mod vault;

pub use memory::MemoryStore;
pub use traits::{EventLog, ParticipantStore, RoomStore, SessionVault};
pub use vault::{JsonFileVault, MemoryVault};
