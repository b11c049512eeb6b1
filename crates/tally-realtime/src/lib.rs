//! # tally-realtime
//!
//! Change broadcast engine for Tally. Bridges the persistence service's
//! change notifications into full-snapshot [`RoomUpdate`] messages that
//! every local subscriber consumes, guaranteeing eventual convergence of
//! all connected clients to the same canonical state.

pub mod broadcaster;
pub mod message;

pub use broadcaster::{BroadcasterHandle, EventBroadcaster};
pub use message::RoomUpdate;
