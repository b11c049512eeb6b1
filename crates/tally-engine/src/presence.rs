//! Participant presence lifecycle tracking.

use dashmap::DashMap;
use tracing::warn;

use tally_core::types::ParticipantId;
use tally_entity::{Participant, PresenceStatus};

/// Tracks the presence status of participants in one room.
///
/// Legal transitions: Joining→Active (join or verification succeeded),
/// Active→Inactive (explicit leave or a best-effort terminal signal), and
/// Inactive→Active (verified reconnect). Same-state transitions are
/// idempotent no-ops.
///
/// Known coverage gap: the terminal lifecycle signal is best-effort and
/// not guaranteed to fire. There is no timeout-based reaper, so a crashed
/// client can leave a stale Active participant indefinitely.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// Participant ID → current status.
    statuses: DashMap<ParticipantId, PresenceStatus>,
}

impl PresenceTracker {
    /// Create a new presence tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a join is in flight for a new identity.
    pub fn begin_join(&self, id: ParticipantId) {
        self.statuses.insert(id, PresenceStatus::Joining);
    }

    /// Transition a participant to Active. Returns `false` if the
    /// transition was illegal and ignored.
    pub fn mark_active(&self, id: ParticipantId) -> bool {
        self.transition(id, PresenceStatus::Active)
    }

    /// Transition a participant to Inactive. Returns `false` if the
    /// transition was illegal and ignored.
    pub fn mark_inactive(&self, id: ParticipantId) -> bool {
        self.transition(id, PresenceStatus::Inactive)
    }

    /// Current status of a participant. Untracked participants are
    /// Inactive.
    pub fn status(&self, id: ParticipantId) -> PresenceStatus {
        self.statuses
            .get(&id)
            .map(|s| *s.value())
            .unwrap_or(PresenceStatus::Inactive)
    }

    /// Number of participants currently tracked as Active.
    pub fn active_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.value().is_active()).count()
    }

    /// Reconcile local statuses from an authoritative Active roster.
    ///
    /// Everyone in the roster becomes Active; previously Active
    /// participants missing from it become Inactive. In-flight Joining
    /// entries are left alone until their join settles.
    pub fn sync_roster(&self, roster: &[Participant]) {
        for participant in roster {
            self.statuses
                .insert(participant.id, PresenceStatus::Active);
        }
        for mut entry in self.statuses.iter_mut() {
            if *entry.value() == PresenceStatus::Active
                && !roster.iter().any(|p| p.id == *entry.key())
            {
                *entry.value_mut() = PresenceStatus::Inactive;
            }
        }
    }

    fn transition(&self, id: ParticipantId, to: PresenceStatus) -> bool {
        let mut entry = self.statuses.entry(id).or_insert(PresenceStatus::Inactive);
        let from = *entry.value();
        if from == to {
            return true;
        }
        if !Self::is_legal(from, to) {
            warn!(
                participant_id = %id,
                from = %from,
                to = %to,
                "Ignoring illegal presence transition"
            );
            return false;
        }
        *entry.value_mut() = to;
        true
    }

    fn is_legal(from: PresenceStatus, to: PresenceStatus) -> bool {
        use PresenceStatus::*;
        matches!(
            (from, to),
            (Joining, Active) | (Joining, Inactive) | (Active, Inactive) | (Inactive, Active)
        )
    }
}
