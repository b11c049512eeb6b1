//! Presence status for a participant.

use serde::{Deserialize, Serialize};

/// Presence status for a participant.
///
/// Modeled as a tagged state rather than a bare boolean so that future
/// states (e.g. banned) can be added without breaking consumers that
/// rely on the Active/Inactive distinction. `Joining` is a transient
/// client-side state; persisted records are either Active or Inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// A join is in flight and not yet confirmed.
    Joining,
    /// The participant is currently connected to the room.
    Active,
    /// The participant has left or was disconnected.
    Inactive,
}

impl PresenceStatus {
    /// Check whether the participant is considered connected.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joining => "joining",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = tally_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "joining" => Ok(Self::Joining),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(tally_core::AppError::validation(format!(
                "Invalid presence status: '{s}'"
            ))),
        }
    }
}
