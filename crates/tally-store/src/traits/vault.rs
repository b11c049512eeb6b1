//! Local durable session store.

use tally_core::AppResult;
use tally_entity::StoredSession;

/// Durable storage for the client's own session record.
///
/// Synchronous by design: this models a local store (a file on disk),
/// not network I/O.
pub trait SessionVault: Send + Sync + 'static {
    /// Load the stored session, if any.
    fn load(&self) -> AppResult<Option<StoredSession>>;

    /// Persist the session record, replacing any previous one.
    fn save(&self, session: &StoredSession) -> AppResult<()>;

    /// Remove the stored session record.
    fn clear(&self) -> AppResult<()>;
}
