//! File-backed session vault.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use tally_core::{AppError, AppResult};
use tally_entity::StoredSession;

use crate::traits::SessionVault;

/// Stores the session record as a JSON file on disk.
///
/// A missing file simply means no session has been saved yet.
#[derive(Debug, Clone)]
pub struct JsonFileVault {
    /// Path of the JSON file.
    path: PathBuf,
}

impl JsonFileVault {
    /// Create a vault backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionVault for JsonFileVault {
    fn load(&self) -> AppResult<Option<StoredSession>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::from(e)),
        };
        let session = serde_json::from_str(&raw)?;
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::from(e)),
        }
    }
}
