//! Session persistence configuration.

use serde::{Deserialize, Serialize};

/// Local session vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the JSON file holding the durable session record.
    #[serde(default = "default_vault_path")]
    pub vault_path: String,
    /// Number of random bytes in an issued session token.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            token_bytes: default_token_bytes(),
        }
    }
}

fn default_vault_path() -> String {
    "data/session.json".to_string()
}

fn default_token_bytes() -> usize {
    32
}
