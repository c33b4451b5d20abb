use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::opening_engine::error::Result;

/// Default pause before the book opponent answers.
pub const DEFAULT_OPPONENT_DELAY_MS: u64 = 500;

/// Tunables for a practice session.
///
/// Every field has a default, so an empty JSON object (`{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PracticeConfig {
    /// Simulated "thinking" time before each opponent move.
    pub opponent_delay_ms: u64,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        PracticeConfig {
            opponent_delay_ms: DEFAULT_OPPONENT_DELAY_MS,
        }
    }
}

impl PracticeConfig {
    /// Opponent replies become due as soon as they are scheduled.
    pub fn instant() -> Self {
        PracticeConfig { opponent_delay_ms: 0 }
    }

    pub fn opponent_delay(&self) -> Duration {
        Duration::from_millis(self.opponent_delay_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
