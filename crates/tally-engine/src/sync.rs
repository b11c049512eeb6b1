//! Speculative counter mutation with authoritative reconciliation.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use tally_core::types::{ParticipantId, RoomId};
use tally_core::{AppError, AppResult};
use tally_entity::Room;
use tally_store::{EventLog, RoomStore};

use crate::limiter::RateLimiter;

/// Applies speculative local counter mutations and reconciles the cached
/// room snapshot with authoritative writes.
///
/// The cached snapshot is possibly stale; the persistence service owns
/// the authoritative record. Authoritative writes are unconditional sets,
/// so concurrent writers race and updates can be lost — an intentional
/// trade-off, not a bug to fix here.
pub struct CounterSync {
    /// The room being mutated.
    room_id: RoomId,
    /// Locally cached room snapshot.
    cache: Arc<RwLock<Room>>,
    /// Room persistence.
    rooms: Arc<dyn RoomStore>,
    /// Audit event log.
    events: Arc<dyn EventLog>,
    /// Per-session rate limiter, shared by reference.
    limiter: Arc<Mutex<RateLimiter>>,
}

impl CounterSync {
    /// Create a counter synchronizer over an existing cached snapshot.
    pub fn new(
        room_id: RoomId,
        cache: Arc<RwLock<Room>>,
        rooms: Arc<dyn RoomStore>,
        events: Arc<dyn EventLog>,
        limiter: Arc<Mutex<RateLimiter>>,
    ) -> Self {
        Self {
            room_id,
            cache,
            rooms,
            events,
            limiter,
        }
    }

    /// The current cached room snapshot. Speculative mutations are
    /// visible here before the authoritative write settles.
    pub async fn snapshot(&self) -> Room {
        self.cache.read().await.clone()
    }

    /// Overwrite the cached snapshot with an authoritative one.
    /// Last-write-wins, no merge.
    pub async fn reconcile(&self, room: Room) {
        *self.cache.write().await = room;
    }

    /// Apply a ±1 mutation on behalf of `actor`.
    ///
    /// The delta is validated against the room direction (rejections make
    /// no network call), gated through the rate limiter, applied to the
    /// cached snapshot immediately, and then written unconditionally to
    /// the persistence service. A failed write rolls the cache back to
    /// the value held before the speculative update — not to a freshly
    /// re-fetched one — and surfaces the error so the caller can retry.
    ///
    /// Returns the new locally observed count.
    pub async fn apply(&self, delta: i64, actor: ParticipantId) -> AppResult<i64> {
        let now = Utc::now();

        let (previous, new_count) = {
            let mut cache = self.cache.write().await;

            if !cache.permits(delta) {
                return Err(AppError::validation(format!(
                    "Room direction '{}' does not permit a delta of {delta}",
                    cache.direction
                )));
            }

            let mut limiter = self.limiter.lock().await;
            if !limiter.try_consume() {
                return Err(AppError::rate_limited(limiter.remaining_cooldown()));
            }
            drop(limiter);

            let previous = cache.current_count;
            cache.current_count = previous + delta;
            cache.last_activity = now;
            (previous, previous + delta)
        };

        if let Err(e) = self
            .rooms
            .write_room_count(self.room_id, new_count, now)
            .await
        {
            warn!(
                room_id = %self.room_id,
                new_count,
                error = %e,
                "Authoritative count write failed, rolling back speculative update"
            );
            self.cache.write().await.current_count = previous;
            return Err(e);
        }

        // Best-effort audit trail, detached from the mutation path.
        let events = Arc::clone(&self.events);
        let room_id = self.room_id;
        tokio::spawn(async move {
            if let Err(e) = events.append_count_event(room_id, actor, delta).await {
                debug!(room_id = %room_id, error = %e, "Count event append failed");
            }
        });

        Ok(new_count)
    }
}

impl std::fmt::Debug for CounterSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterSync")
            .field("room_id", &self.room_id)
            .finish()
    }
}
