use serde::{Deserialize, Serialize};

/// Measured latency of one successful round, as submitted to the stats service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    #[serde(rename = "time")]
    pub reaction_time_ms: u64,
}

impl TrialResult {
    pub fn new(reaction_time_ms: u64) -> Self {
        Self { reaction_time_ms }
    }
}
