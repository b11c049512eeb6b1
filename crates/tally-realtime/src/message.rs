//! Outbound update message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_entity::{Participant, Room};

/// Updates delivered to local subscribers.
///
/// Every update carries full state, never a delta. Subscribers overwrite
/// their cached copy unconditionally (last-write-wins); intermediate
/// states superseded before a subscriber observed them are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomUpdate {
    /// The authoritative room record changed.
    RoomChanged {
        /// The full updated room snapshot.
        room: Room,
        /// When the update was observed.
        timestamp: DateTime<Utc>,
    },
    /// The room's participant set changed.
    RosterChanged {
        /// All Active participants, ordered by join time ascending.
        participants: Vec<Participant>,
        /// When the update was observed.
        timestamp: DateTime<Utc>,
    },
}

impl RoomUpdate {
    /// Wrap a room snapshot, stamped with the current time.
    pub fn room_changed(room: Room) -> Self {
        Self::RoomChanged {
            room,
            timestamp: Utc::now(),
        }
    }

    /// Wrap a roster, stamped with the current time.
    pub fn roster_changed(participants: Vec<Participant>) -> Self {
        Self::RosterChanged {
            participants,
            timestamp: Utc::now(),
        }
    }
}
