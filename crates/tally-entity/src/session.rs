//! Locally persisted session record.

use serde::{Deserialize, Serialize};

use tally_core::types::{ParticipantId, RoomId};

/// The session record kept in the client's durable vault.
///
/// Restoring this record and re-verifying the token lets a participant
/// reconnect to a room without creating a duplicate identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The participant identity established at join time.
    pub participant_id: ParticipantId,
    /// The opaque session token issued at join time.
    pub token: String,
    /// The room the session belongs to.
    pub room_id: RoomId,
}
