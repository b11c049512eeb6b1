//! In-memory session vault for tests and the simulation.

use std::sync::Mutex;

use tally_core::AppResult;
use tally_entity::StoredSession;

use crate::traits::SessionVault;

/// Keeps the session record in memory only.
#[derive(Debug, Default)]
pub struct MemoryVault {
    inner: Mutex<Option<StoredSession>>,
}

impl MemoryVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        // Nothing panics while holding this lock, but recover from
        // poisoning anyway rather than propagating a panic.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl SessionVault for MemoryVault {
    fn load(&self) -> AppResult<Option<StoredSession>> {
        Ok(self.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> AppResult<()> {
        *self.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.lock() = None;
        Ok(())
    }
}
