//! # tally-engine
//!
//! The counter synchronization and presence engine. Provides:
//!
//! - Speculative local counter mutation with authoritative reconciliation
//! - Session issue/verify with opaque tokens and reconnect support
//! - Participant presence lifecycle (Joining/Active/Inactive)
//! - Sliding-window client-side rate limiting
//! - The [`RoomEngine`] facade exposed to the UI collaborator

pub mod engine;
pub mod limiter;
pub mod presence;
pub mod session;
pub mod sync;

pub use engine::RoomEngine;
pub use limiter::RateLimiter;
pub use presence::PresenceTracker;
pub use session::SessionManager;
pub use sync::CounterSync;
