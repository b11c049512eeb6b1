//! Single-node in-memory implementation of the store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

use tally_core::types::{ParticipantId, RoomId};
use tally_core::{AppError, AppResult};
use tally_entity::{CountEvent, Direction, Participant, PresenceStatus, Room};

use crate::traits::{EventLog, ParticipantStore, RoomStore};

/// In-memory persistence-and-subscription service.
///
/// Backs the simulation binary and the test suite. Counter writes are
/// unconditional sets, matching the semantics the engine is specified
/// against: two clients writing concurrently race, and the last write
/// wins.
#[derive(Debug)]
pub struct MemoryStore {
    /// Room ID → authoritative room record.
    rooms: DashMap<RoomId, Room>,
    /// Participant ID → participant record.
    participants: DashMap<ParticipantId, Participant>,
    /// Append-only count event log.
    events: Mutex<Vec<CountEvent>>,
    /// Room ID → room change broadcast sender.
    room_txs: DashMap<RoomId, broadcast::Sender<Room>>,
    /// Room ID → participant change broadcast sender.
    participant_txs: DashMap<RoomId, broadcast::Sender<()>>,
    /// Buffer size for broadcast channels.
    buffer_size: usize,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            participants: DashMap::new(),
            events: Mutex::new(Vec::new()),
            room_txs: DashMap::new(),
            participant_txs: DashMap::new(),
            buffer_size,
        }
    }

    /// Create a room record.
    ///
    /// Room creation is an external admin flow as far as the engine is
    /// concerned; this exists so the simulation and tests can seed rooms.
    pub fn create_room(
        &self,
        name: &str,
        subject: &str,
        direction: Direction,
        admin_id: Option<ParticipantId>,
    ) -> Room {
        let now = Utc::now();
        let room = Room {
            id: RoomId::new(),
            name: name.to_string(),
            subject: subject.to_string(),
            direction,
            current_count: 0,
            created_at: now,
            last_activity: now,
            admin_id,
        };
        self.rooms.insert(room.id, room.clone());
        debug!(room_id = %room.id, name, "Room created");
        room
    }

    /// Return all recorded count events for a room, oldest first.
    pub async fn events_for(&self, room_id: RoomId) -> Vec<CountEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|e| e.room_id == room_id)
            .cloned()
            .collect()
    }

    fn publish_room(&self, room: Room) {
        if let Some(tx) = self.room_txs.get(&room.id) {
            // No receivers is fine; the error just means nobody is listening.
            let _ = tx.send(room);
        }
    }

    fn publish_participant_change(&self, room_id: RoomId) {
        if let Some(tx) = self.participant_txs.get(&room_id) {
            let _ = tx.send(());
        }
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn read_room(&self, room_id: RoomId) -> AppResult<Room> {
        self.rooms
            .get(&room_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))
    }

    async fn write_room_count(
        &self,
        room_id: RoomId,
        new_count: i64,
        activity: DateTime<Utc>,
    ) -> AppResult<()> {
        let updated = {
            let mut entry = self
                .rooms
                .get_mut(&room_id)
                .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
            entry.current_count = new_count;
            entry.last_activity = activity;
            entry.value().clone()
        };
        self.publish_room(updated);
        Ok(())
    }

    async fn touch_room_activity(&self, room_id: RoomId, at: DateTime<Utc>) -> AppResult<()> {
        let updated = {
            let mut entry = self
                .rooms
                .get_mut(&room_id)
                .ok_or_else(|| AppError::not_found(format!("Room {room_id} not found")))?;
            entry.last_activity = at;
            entry.value().clone()
        };
        self.publish_room(updated);
        Ok(())
    }

    fn subscribe_room_changes(&self, room_id: RoomId) -> broadcast::Receiver<Room> {
        self.room_txs
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn read_active_participants(&self, room_id: RoomId) -> AppResult<Vec<Participant>> {
        let mut active: Vec<Participant> = self
            .participants
            .iter()
            .filter(|p| p.room_id == room_id && p.is_active())
            .map(|p| p.value().clone())
            .collect();
        active.sort_by_key(|p| (p.joined_at, p.id));
        Ok(active)
    }

    async fn insert_participant(
        &self,
        room_id: RoomId,
        display_name: &str,
        icon: &str,
        session_token: &str,
    ) -> AppResult<Participant> {
        if !self.rooms.contains_key(&room_id) {
            return Err(AppError::not_found(format!("Room {room_id} not found")));
        }
        let participant = Participant {
            id: ParticipantId::new(),
            room_id,
            display_name: display_name.to_string(),
            icon: icon.to_string(),
            joined_at: Utc::now(),
            session_token: session_token.to_string(),
            status: PresenceStatus::Active,
        };
        self.participants
            .insert(participant.id, participant.clone());
        self.publish_participant_change(room_id);
        debug!(
            participant_id = %participant.id,
            room_id = %room_id,
            display_name,
            "Participant inserted"
        );
        Ok(participant)
    }

    async fn find_participant(&self, id: ParticipantId) -> AppResult<Option<Participant>> {
        Ok(self.participants.get(&id).map(|p| p.value().clone()))
    }

    async fn set_participant_active(&self, id: ParticipantId, active: bool) -> AppResult<()> {
        let room_id = {
            let mut entry = self
                .participants
                .get_mut(&id)
                .ok_or_else(|| AppError::not_found(format!("Participant {id} not found")))?;
            entry.status = if active {
                PresenceStatus::Active
            } else {
                PresenceStatus::Inactive
            };
            entry.room_id
        };
        self.publish_participant_change(room_id);
        Ok(())
    }

    fn subscribe_participant_changes(&self, room_id: RoomId) -> broadcast::Receiver<()> {
        self.participant_txs
            .entry(room_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }
}

#[async_trait]
impl EventLog for MemoryStore {
    async fn append_count_event(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
        delta: i64,
    ) -> AppResult<()> {
        let event = CountEvent::new(room_id, participant_id, delta);
        self.events.lock().await.push(event);
        Ok(())
    }
}
