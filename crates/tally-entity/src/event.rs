//! Count event audit record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_core::types::{EventId, ParticipantId, RoomId};

/// An append-only audit record of a single accepted counter mutation.
///
/// Best-effort only: delivery is never retried and failures are never
/// surfaced. The canonical counter value does not depend on these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// The room whose counter changed.
    pub room_id: RoomId,
    /// The participant who caused the change.
    pub participant_id: ParticipantId,
    /// The applied change, always +1 or -1.
    pub delta: i64,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl CountEvent {
    /// Create a new count event stamped with the current time.
    pub fn new(room_id: RoomId, participant_id: ParticipantId, delta: i64) -> Self {
        Self {
            id: EventId::new(),
            room_id,
            participant_id,
            delta,
            recorded_at: Utc::now(),
        }
    }
}
