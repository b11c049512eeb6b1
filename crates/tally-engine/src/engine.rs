//! The room engine facade exposed to the UI collaborator.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use tally_core::config::AppConfig;
use tally_core::error::ErrorKind;
use tally_core::types::RoomId;
use tally_core::{AppError, AppResult};
use tally_entity::{Participant, Room, StoredSession};
use tally_realtime::{BroadcasterHandle, EventBroadcaster, RoomUpdate};
use tally_store::{EventLog, ParticipantStore, RoomStore, SessionVault};

use crate::limiter::RateLimiter;
use crate::presence::PresenceTracker;
use crate::session::SessionManager;
use crate::sync::CounterSync;

/// One client's connection to one room.
///
/// Wires the rate limiter, session manager, presence tracker, counter
/// synchronizer, and event broadcaster together, and owns this client's
/// participant identity. All component lifetimes are scoped to this
/// engine — nothing is shared across room sessions.
pub struct RoomEngine {
    /// The room this engine is attached to.
    room_id: RoomId,
    /// Participant persistence.
    participants: Arc<dyn ParticipantStore>,
    /// Local durable session store.
    vault: Arc<dyn SessionVault>,
    /// Session credential management.
    sessions: SessionManager,
    /// Presence lifecycle tracking.
    presence: Arc<PresenceTracker>,
    /// Counter mutation and reconciliation.
    sync: CounterSync,
    /// This client's own participant identity, if joined.
    identity: RwLock<Option<Participant>>,
    /// Fan-out of authoritative updates to UI subscribers.
    updates_tx: broadcast::Sender<RoomUpdate>,
    /// Reconciliation task consuming the broadcaster.
    reconcile_task: JoinHandle<()>,
    /// Keeps the broadcaster's forwarding tasks alive.
    _broadcaster: BroadcasterHandle,
}

impl RoomEngine {
    /// Open a room: read the authoritative record, touch its activity
    /// timestamp, and start the reconciliation pipeline.
    ///
    /// Fails with a not-found error when the room does not exist.
    pub async fn open(
        room_id: RoomId,
        rooms: Arc<dyn RoomStore>,
        participants: Arc<dyn ParticipantStore>,
        events: Arc<dyn EventLog>,
        vault: Arc<dyn SessionVault>,
        config: &AppConfig,
    ) -> AppResult<Self> {
        let room = rooms.read_room(room_id).await?;

        // Activity touch is non-critical; opening still succeeds if it
        // cannot be recorded.
        if let Err(e) = rooms.touch_room_activity(room_id, Utc::now()).await {
            warn!(room_id = %room_id, error = %e, "Failed to touch room activity");
        }

        let cache = Arc::new(RwLock::new(room));
        let limiter = Arc::new(Mutex::new(RateLimiter::new(&config.limiter)));
        let sync = CounterSync::new(
            room_id,
            Arc::clone(&cache),
            Arc::clone(&rooms),
            events,
            limiter,
        );

        let broadcaster = EventBroadcaster::new(
            room_id,
            Arc::clone(&rooms),
            Arc::clone(&participants),
            config.realtime.channel_buffer_size,
        );
        let broadcaster_rx = broadcaster.subscribe();
        let broadcaster_handle = broadcaster.start();

        let presence = Arc::new(PresenceTracker::new());
        let updates_tx = broadcast::channel(config.realtime.channel_buffer_size).0;
        let reconcile_task = Self::spawn_reconciler(
            broadcaster_rx,
            Arc::clone(&cache),
            Arc::clone(&presence),
            updates_tx.clone(),
        );

        let sessions = SessionManager::new(Arc::clone(&participants), &config.session);

        info!(room_id = %room_id, "Room engine opened");

        Ok(Self {
            room_id,
            participants,
            vault,
            sessions,
            presence,
            sync,
            identity: RwLock::new(None),
            updates_tx,
            reconcile_task,
            _broadcaster: broadcaster_handle,
        })
    }

    /// Join the room under a new identity.
    ///
    /// Fails with a validation error for blank inputs and a conflict
    /// error when the display name is already held by an Active
    /// participant (case-sensitive exact match). On success the session
    /// is persisted to the vault for later reconnects.
    pub async fn join(&self, display_name: &str, icon: &str) -> AppResult<Participant> {
        let display_name = display_name.trim();
        let icon = icon.trim();
        if display_name.is_empty() {
            return Err(AppError::validation("Display name is required"));
        }
        if icon.is_empty() {
            return Err(AppError::validation("Icon is required"));
        }

        let roster = self
            .participants
            .read_active_participants(self.room_id)
            .await?;
        if roster.iter().any(|p| p.display_name == display_name) {
            return Err(AppError::conflict(format!(
                "Display name '{display_name}' is already taken in this room"
            )));
        }

        let token = self.sessions.issue();
        let participant = self
            .participants
            .insert_participant(self.room_id, display_name, icon, &token)
            .await?;
        self.presence.begin_join(participant.id);

        // Losing the vault record only costs reconnect convenience.
        if let Err(e) = self.vault.save(&StoredSession {
            participant_id: participant.id,
            token,
            room_id: self.room_id,
        }) {
            warn!(
                participant_id = %participant.id,
                error = %e,
                "Failed to persist session to vault"
            );
        }

        self.presence.mark_active(participant.id);
        *self.identity.write().await = Some(participant.clone());

        info!(
            room_id = %self.room_id,
            participant_id = %participant.id,
            display_name,
            "Joined room"
        );
        Ok(participant)
    }

    /// Restore a previous identity from the vault and re-verify its
    /// token.
    ///
    /// Returns `Ok(None)` when the vault is empty or holds a session for
    /// another room. An auth failure clears the vault and is surfaced so
    /// the caller can fall back to a fresh join.
    pub async fn resume(&self) -> AppResult<Option<Participant>> {
        let Some(stored) = self.vault.load()? else {
            return Ok(None);
        };
        if stored.room_id != self.room_id {
            return Ok(None);
        }

        match self
            .sessions
            .verify(stored.participant_id, &stored.token)
            .await
        {
            Ok(participant) => {
                self.presence.mark_active(participant.id);
                *self.identity.write().await = Some(participant.clone());
                info!(
                    room_id = %self.room_id,
                    participant_id = %participant.id,
                    "Session resumed"
                );
                Ok(Some(participant))
            }
            Err(e) if e.is(ErrorKind::Auth) => {
                if let Err(clear_err) = self.vault.clear() {
                    warn!(error = %clear_err, "Failed to clear stale session from vault");
                }
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Leave the room.
    ///
    /// Deactivation and vault cleanup are best-effort: failures are
    /// logged and swallowed, never surfaced.
    pub async fn leave(&self) {
        let Some(participant) = self.identity.write().await.take() else {
            return;
        };

        if let Err(e) = self
            .participants
            .set_participant_active(participant.id, false)
            .await
        {
            warn!(
                participant_id = %participant.id,
                error = %e,
                "Failed to deactivate participant on leave"
            );
        }
        if let Err(e) = self.vault.clear() {
            warn!(error = %e, "Failed to clear session from vault");
        }
        self.presence.mark_inactive(participant.id);

        info!(
            room_id = %self.room_id,
            participant_id = %participant.id,
            "Left room"
        );
    }

    /// Increment the counter. Requires a joined identity.
    pub async fn increment(&self) -> AppResult<i64> {
        let actor = self.require_identity().await?;
        self.sync.apply(1, actor).await
    }

    /// Decrement the counter. Requires a joined identity.
    pub async fn decrement(&self) -> AppResult<i64> {
        let actor = self.require_identity().await?;
        self.sync.apply(-1, actor).await
    }

    /// The current cached room snapshot, speculative updates included.
    pub async fn snapshot(&self) -> Room {
        self.sync.snapshot().await
    }

    /// All Active participants of the room, ordered by join time
    /// ascending.
    pub async fn roster(&self) -> AppResult<Vec<Participant>> {
        self.participants
            .read_active_participants(self.room_id)
            .await
    }

    /// This client's own participant identity, if joined.
    pub async fn identity(&self) -> Option<Participant> {
        self.identity.read().await.clone()
    }

    /// Subscribe to authoritative room and roster updates.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.updates_tx.subscribe()
    }

    /// Presence tracker for this room session.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    async fn require_identity(&self) -> AppResult<tally_core::types::ParticipantId> {
        self.identity
            .read()
            .await
            .as_ref()
            .map(|p| p.id)
            .ok_or_else(|| AppError::auth("Join the room before counting"))
    }

    fn spawn_reconciler(
        mut rx: broadcast::Receiver<RoomUpdate>,
        cache: Arc<RwLock<Room>>,
        presence: Arc<PresenceTracker>,
        tx: broadcast::Sender<RoomUpdate>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(update) => {
                        match &update {
                            RoomUpdate::RoomChanged { room, .. } => {
                                // Canonical snapshot wins over whatever the
                                // cache holds, speculative or not.
                                *cache.write().await = room.clone();
                            }
                            RoomUpdate::RosterChanged { participants, .. } => {
                                presence.sync_roster(participants);
                            }
                        }
                        let _ = tx.send(update);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Update stream lagged, skipping to latest");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for RoomEngine {
    fn drop(&mut self) {
        self.reconcile_task.abort();
    }
}

impl std::fmt::Debug for RoomEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomEngine")
            .field("room_id", &self.room_id)
            .finish()
    }
}
