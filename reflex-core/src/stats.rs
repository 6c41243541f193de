use serde::{Deserialize, Serialize};

use crate::distribution::effective_stdev;

/// Population statistics returned by `GET /global_stats`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub mean: f64,
    pub stdev: Option<f64>,
    pub count: u64,
    pub total_users: u64,
}

impl GlobalStats {
    pub fn curve_stdev(&self) -> f64 {
        effective_stdev(self.stdev)
    }

    pub fn participants_text(&self) -> String {
        participants_text(self.total_users)
    }
}

/// Personal and population statistics returned by `POST /submit`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    pub mean: f64,
    pub stdev: Option<f64>,
    pub count: u64,
    pub percentile: f64,
    pub global_mean: f64,
    pub global_stdev: Option<f64>,
    pub total_users: u64,
}

impl StatsSnapshot {
    pub fn curve_stdev(&self) -> f64 {
        effective_stdev(self.stdev)
    }

    pub fn global_curve_stdev(&self) -> f64 {
        effective_stdev(self.global_stdev)
    }

    pub fn summary_text(&self) -> String {
        format!(
            "Mean: {:.2} ms  -  Stdev: {:.2}  -  Trials: {}",
            self.mean,
            self.stdev.unwrap_or(0.0),
            self.count
        )
    }

    pub fn percentile_text(&self) -> String {
        format!("You are in the {:.1}th percentile", self.percentile)
    }

    pub fn participants_text(&self) -> String {
        participants_text(self.total_users)
    }
}

fn participants_text(total_users: u64) -> String {
    format!("Number of participants: {total_users}")
}
