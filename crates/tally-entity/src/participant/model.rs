//! Participant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::types::{ParticipantId, RoomId};

use super::PresenceStatus;

/// An identified member of a room.
///
/// Participants are never deleted. Leaving a room sets the status to
/// Inactive, preserving history and preventing token reuse ambiguity.
/// Among Active participants of the same room, `display_name` is unique
/// (case-sensitive exact match).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identifier.
    pub id: ParticipantId,
    /// The room this participant belongs to.
    pub room_id: RoomId,
    /// Display name shown in the roster.
    pub display_name: String,
    /// Chosen icon.
    pub icon: String,
    /// When the participant first joined the room.
    pub joined_at: DateTime<Utc>,
    /// Opaque, unguessable session credential issued at join time.
    pub session_token: String,
    /// Current presence status.
    pub status: PresenceStatus,
}

impl Participant {
    /// Check whether the participant is currently Active.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
