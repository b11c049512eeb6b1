//! Counting direction for a room.

use serde::{Deserialize, Serialize};

/// Which counter mutations a room permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Only increments are permitted.
    Up,
    /// Only decrements are permitted.
    Down,
    /// Both increments and decrements are permitted.
    Both,
}

impl Direction {
    /// Check whether the given delta is permitted by this direction.
    ///
    /// The counter only ever moves by ±1 per accepted event, so any
    /// other delta is rejected regardless of direction.
    pub fn permits(&self, delta: i64) -> bool {
        match self {
            Self::Up => delta == 1,
            Self::Down => delta == -1,
            Self::Both => delta == 1 || delta == -1,
        }
    }

    /// Return the direction as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Both => "both",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = tally_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "both" => Ok(Self::Both),
            _ => Err(tally_core::AppError::validation(format!(
                "Invalid direction: '{s}'"
            ))),
        }
    }
}
