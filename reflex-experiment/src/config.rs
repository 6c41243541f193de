use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("arm delay range is empty: min {min} ms > max {max} ms")]
    EmptyArmDelay { min: u64, max: u64 },
    #[error("response timeout must be positive")]
    ZeroTimeout,
}

/// Timing constants of a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Lower bound of the random wait before the box arms.
    pub arm_delay_min_ms: u64,
    /// Upper bound (exclusive unless equal to the lower bound).
    pub arm_delay_max_ms: u64,
    pub response_timeout_ms: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            arm_delay_min_ms: 2000,
            arm_delay_max_ms: 5000,
            response_timeout_ms: 5000,
        }
    }
}

impl ReactionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arm_delay_min_ms > self.arm_delay_max_ms {
            return Err(ConfigError::EmptyArmDelay {
                min: self.arm_delay_min_ms,
                max: self.arm_delay_max_ms,
            });
        }
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
