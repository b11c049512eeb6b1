//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use tally_core::config::AppConfig;
use tally_core::types::{ParticipantId, RoomId};
use tally_core::{AppError, AppResult};
use tally_engine::RoomEngine;
use tally_entity::{Direction, Participant, Room};
use tally_store::{EventLog, MemoryStore, MemoryVault, RoomStore, SessionVault};

/// A seeded room with its backing store and configuration.
pub struct TestBed {
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
    pub room: Room,
}

impl TestBed {
    pub fn new(direction: Direction) -> Self {
        Self::with_config(direction, AppConfig::default())
    }

    pub fn with_config(direction: Direction, config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new(config.realtime.channel_buffer_size));
        let room = store.create_room("test room", "reps", direction, None);
        Self {
            store,
            config,
            room,
        }
    }

    /// Open an engine over the shared store with a fresh in-memory vault.
    pub async fn engine(&self) -> RoomEngine {
        self.engine_with_vault(Arc::new(MemoryVault::new())).await
    }

    /// Open an engine sharing the given vault (reconnect scenarios).
    pub async fn engine_with_vault(&self, vault: Arc<dyn SessionVault>) -> RoomEngine {
        RoomEngine::open(
            self.room.id,
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            vault,
            &self.config,
        )
        .await
        .expect("open engine")
    }

    /// Open an engine whose room writes go through a wrapped store
    /// (failure injection scenarios).
    pub async fn engine_with_rooms(&self, rooms: Arc<dyn RoomStore>) -> RoomEngine {
        RoomEngine::open(
            self.room.id,
            rooms,
            self.store.clone(),
            self.store.clone(),
            Arc::new(MemoryVault::new()),
            &self.config,
        )
        .await
        .expect("open engine")
    }
}

/// Room store wrapper that can be told to fail counter writes.
pub struct FlakyRoomStore {
    inner: Arc<MemoryStore>,
    fail_writes: AtomicBool,
    /// Set once a counter write has entered this store.
    write_entered: AtomicBool,
    /// While held, counter writes block until released.
    gate: tokio::sync::Semaphore,
    gated: AtomicBool,
}

impl FlakyRoomStore {
    pub fn new(inner: Arc<MemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_writes: AtomicBool::new(false),
            write_entered: AtomicBool::new(false),
            gate: tokio::sync::Semaphore::new(0),
            gated: AtomicBool::new(false),
        })
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next counter writes block until [`Self::release`].
    pub fn hold_writes(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.add_permits(1);
    }

    /// Wait until a counter write is in flight.
    pub async fn write_in_flight(&self) {
        while !self.write_entered.load(Ordering::SeqCst) {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl RoomStore for FlakyRoomStore {
    async fn read_room(&self, room_id: RoomId) -> AppResult<Room> {
        self.inner.read_room(room_id).await
    }

    async fn write_room_count(
        &self,
        room_id: RoomId,
        new_count: i64,
        activity: DateTime<Utc>,
    ) -> AppResult<()> {
        self.write_entered.store(true, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let _permit = self.gate.acquire().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::io("injected write failure"));
        }
        self.inner.write_room_count(room_id, new_count, activity).await
    }

    async fn touch_room_activity(&self, room_id: RoomId, at: DateTime<Utc>) -> AppResult<()> {
        self.inner.touch_room_activity(room_id, at).await
    }

    fn subscribe_room_changes(&self, room_id: RoomId) -> broadcast::Receiver<Room> {
        self.inner.subscribe_room_changes(room_id)
    }
}

/// Event log wrapper that always fails.
pub struct FailingEventLog;

#[async_trait]
impl EventLog for FailingEventLog {
    async fn append_count_event(
        &self,
        _room_id: RoomId,
        _participant_id: ParticipantId,
        _delta: i64,
    ) -> AppResult<()> {
        Err(AppError::io("injected audit failure"))
    }
}

/// Collect display names from a roster.
pub fn names(roster: &[Participant]) -> Vec<&str> {
    roster.iter().map(|p| p.display_name.as_str()).collect()
}
