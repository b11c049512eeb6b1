//! Session credential issue and verification.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use tally_core::config::SessionConfig;
use tally_core::types::ParticipantId;
use tally_core::{AppError, AppResult};
use tally_entity::{Participant, PresenceStatus};
use tally_store::ParticipantStore;

/// Issues and verifies the opaque credentials binding a participant to a
/// room.
///
/// Tokens have no expiry and no invalidation mechanism; they stop working
/// only if the participant or room is removed by an external process.
#[derive(Clone)]
pub struct SessionManager {
    /// Participant persistence.
    participants: Arc<dyn ParticipantStore>,
    /// Number of random bytes per token.
    token_bytes: usize,
}

impl SessionManager {
    /// Create a session manager.
    pub fn new(participants: Arc<dyn ParticipantStore>, config: &SessionConfig) -> Self {
        Self {
            participants,
            token_bytes: config.token_bytes.max(16),
        }
    }

    /// Generate an opaque, unpredictable session token.
    ///
    /// The token is stored alongside the participant record at join time.
    pub fn issue(&self) -> String {
        let mut rng = rand::thread_rng();
        let mut bytes = vec![0u8; self.token_bytes];
        rng.fill(bytes.as_mut_slice());
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Verify a session credential and re-activate the participant.
    ///
    /// Fails with an auth error if no participant with that id exists or
    /// the stored token does not match exactly. Idempotent: repeated
    /// verification with the same valid token is harmless, including from
    /// concurrent observers of the same identity (duplicate tabs).
    pub async fn verify(
        &self,
        participant_id: ParticipantId,
        token: &str,
    ) -> AppResult<Participant> {
        let mut participant = self
            .participants
            .find_participant(participant_id)
            .await?
            .ok_or_else(|| AppError::auth(format!("Unknown participant {participant_id}")))?;

        if participant.session_token != token {
            return Err(AppError::auth("Session token mismatch"));
        }

        // Re-activation is a presence update: transient store failures are
        // logged and swallowed, the verified identity is still returned.
        if let Err(e) = self
            .participants
            .set_participant_active(participant_id, true)
            .await
        {
            warn!(
                participant_id = %participant_id,
                error = %e,
                "Failed to re-activate participant after verification"
            );
        }
        participant.status = PresenceStatus::Active;

        debug!(participant_id = %participant_id, "Session verified");
        Ok(participant)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("token_bytes", &self.token_bytes)
            .finish()
    }
}
