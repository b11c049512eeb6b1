//! Persistence and change-subscription traits.
//!
//! Change subscriptions are [`tokio::sync::broadcast`] receivers; dropping
//! the receiver unsubscribes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use tally_core::AppResult;
use tally_core::types::{ParticipantId, RoomId};
use tally_entity::{Participant, Room};

/// Room persistence operations.
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    /// Read the authoritative room record.
    ///
    /// Returns a not-found error when no room with that id exists.
    async fn read_room(&self, room_id: RoomId) -> AppResult<Room>;

    /// Write a new counter value and activity timestamp for the room.
    ///
    /// This is an unconditional set — there is no version check and no
    /// compare-and-swap, so concurrent writers can race and the last
    /// write wins.
    async fn write_room_count(
        &self,
        room_id: RoomId,
        new_count: i64,
        activity: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Update only the room's last-activity timestamp.
    async fn touch_room_activity(&self, room_id: RoomId, at: DateTime<Utc>) -> AppResult<()>;

    /// Subscribe to authoritative room changes. Each notification carries
    /// the full updated room snapshot, never a delta.
    fn subscribe_room_changes(&self, room_id: RoomId) -> broadcast::Receiver<Room>;
}

/// Participant persistence operations.
#[async_trait]
pub trait ParticipantStore: Send + Sync + 'static {
    /// Read all Active participants of a room, ordered by join time
    /// ascending.
    async fn read_active_participants(&self, room_id: RoomId) -> AppResult<Vec<Participant>>;

    /// Insert a new participant record with the given session token.
    /// The participant starts out Active.
    async fn insert_participant(
        &self,
        room_id: RoomId,
        display_name: &str,
        icon: &str,
        session_token: &str,
    ) -> AppResult<Participant>;

    /// Look up a participant by id.
    async fn find_participant(&self, id: ParticipantId) -> AppResult<Option<Participant>>;

    /// Toggle a participant between Active and Inactive. Participants are
    /// never deleted.
    async fn set_participant_active(&self, id: ParticipantId, active: bool) -> AppResult<()>;

    /// Subscribe to participant-table change notifications for a room.
    /// Notifications carry no payload; consumers re-read the roster.
    fn subscribe_participant_changes(&self, room_id: RoomId) -> broadcast::Receiver<()>;
}

/// Append-only audit log for counter mutations.
#[async_trait]
pub trait EventLog: Send + Sync + 'static {
    /// Append a count event. Fire-and-forget from the caller's point of
    /// view: failures are strictly observability, never correctness.
    async fn append_count_event(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
        delta: i64,
    ) -> AppResult<()>;
}
