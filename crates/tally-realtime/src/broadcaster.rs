//! Event broadcaster — forwards store change notifications to subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use tally_core::types::RoomId;
use tally_store::{ParticipantStore, RoomStore};

use crate::message::RoomUpdate;

/// Delivers authoritative state changes for one room to all local
/// subscribers.
///
/// Subscribes to the persistence service's room and participant change
/// notifications. Room changes are republished as full snapshots. On a
/// participant change the full Active roster is re-read (ordered by join
/// time) and republished.
pub struct EventBroadcaster {
    /// The room being observed.
    room_id: RoomId,
    /// Room persistence.
    rooms: Arc<dyn RoomStore>,
    /// Participant persistence.
    participants: Arc<dyn ParticipantStore>,
    /// Fan-out channel to local subscribers.
    tx: broadcast::Sender<RoomUpdate>,
}

impl EventBroadcaster {
    /// Create a broadcaster for the given room.
    pub fn new(
        room_id: RoomId,
        rooms: Arc<dyn RoomStore>,
        participants: Arc<dyn ParticipantStore>,
        buffer_size: usize,
    ) -> Self {
        Self {
            room_id,
            rooms,
            participants,
            tx: broadcast::channel(buffer_size).0,
        }
    }

    /// Subscribe to updates. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.tx.subscribe()
    }

    /// Start forwarding change notifications.
    ///
    /// Spawns one task per upstream subscription; the returned handle
    /// aborts them on [`BroadcasterHandle::stop`] or drop.
    pub fn start(&self) -> BroadcasterHandle {
        let room_task = self.spawn_room_forwarder();
        let roster_task = self.spawn_roster_forwarder();
        BroadcasterHandle {
            tasks: vec![room_task, roster_task],
        }
    }

    fn spawn_room_forwarder(&self) -> JoinHandle<()> {
        let room_id = self.room_id;
        let mut rx = self.rooms.subscribe_room_changes(room_id);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(room) => {
                        let _ = tx.send(RoomUpdate::room_changed(room));
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Intermediate states were superseded; the next
                        // received snapshot is still the canonical value.
                        warn!(room_id = %room_id, skipped, "Room change stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(room_id = %room_id, "Room change stream closed");
                        break;
                    }
                }
            }
        })
    }

    fn spawn_roster_forwarder(&self) -> JoinHandle<()> {
        let room_id = self.room_id;
        let mut rx = self.participants.subscribe_participant_changes(room_id);
        let participants = Arc::clone(&self.participants);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Notifications carry no payload, so a lagged
                        // receiver loses nothing: re-read and republish.
                        match participants.read_active_participants(room_id).await {
                            Ok(roster) => {
                                let _ = tx.send(RoomUpdate::roster_changed(roster));
                            }
                            Err(e) => {
                                warn!(room_id = %room_id, error = %e, "Roster re-read failed");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(room_id = %room_id, "Participant change stream closed");
                        break;
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("room_id", &self.room_id)
            .finish()
    }
}

/// Owns the broadcaster's forwarding tasks.
#[derive(Debug)]
pub struct BroadcasterHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl BroadcasterHandle {
    /// Stop forwarding. Equivalent to dropping the handle.
    pub fn stop(self) {}
}

impl Drop for BroadcasterHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
