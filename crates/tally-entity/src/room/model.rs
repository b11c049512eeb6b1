//! Room entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::types::{ParticipantId, RoomId};

use super::Direction;

/// A shared counter room.
///
/// The authoritative record is owned by the persistence service; the
/// synchronization engine only ever holds a cached, possibly-stale copy.
/// `current_count` changes by ±1 per accepted event, gated by `direction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: RoomId,
    /// Display name of the room.
    pub name: String,
    /// What is being counted.
    pub subject: String,
    /// Which counter mutations the room permits.
    pub direction: Direction,
    /// The shared counter value. No floor is enforced; rooms counting
    /// down may go negative.
    pub current_count: i64,
    /// When the room was created.
    pub created_at: DateTime<Utc>,
    /// Last counter or presence activity in the room.
    pub last_activity: DateTime<Utc>,
    /// The participant who administers the room, if any.
    pub admin_id: Option<ParticipantId>,
}

impl Room {
    /// Check whether the given delta is permitted by this room's direction.
    pub fn permits(&self, delta: i64) -> bool {
        self.direction.permits(delta)
    }
}
