use crate::chart::{ChartPanel, ChartStyle};
use ab_glyph::FontVec;
use reflex_core::{distribution_curve, GlobalStats, StatsSnapshot};
use std::sync::Arc;
use tracing::debug;

pub const COPY_CONFIRM_MS: u64 = 2000;
const COPY_LABEL: &str = "Copy Link";
const COPIED_LABEL: &str = "Link Copied!";

/// Personal curve shown before the first trial has been submitted.
pub const PLACEHOLDER_USER_CURVE: (f64, f64) = (300.0, 50.0);

/// Share button whose label confirms a copy for a short while
#[derive(Debug, Clone, Default)]
pub struct CopyLinkButton {
    confirmed_until_ns: Option<u64>,
}

impl CopyLinkButton {
    pub fn confirm(&mut self, now_ns: u64) {
        self.confirmed_until_ns = Some(now_ns + COPY_CONFIRM_MS * 1_000_000);
    }

    pub fn label(&self, now_ns: u64) -> &'static str {
        match self.confirmed_until_ns {
            Some(until) if now_ns < until => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }
}

/// Text regions and charts fed by the stats service
pub struct Dashboard {
    font: Option<Arc<FontVec>>,
    pub stats_line: String,
    pub percentile_line: String,
    pub participants_line: String,
    pub user_chart: ChartPanel,
    pub global_chart: ChartPanel,
    pub copy_link: CopyLinkButton,
    has_snapshot: bool,
}

impl Dashboard {
    pub fn new(font: Option<Arc<FontVec>>, chart_size: (u32, u32)) -> Self {
        Self {
            font,
            stats_line: String::new(),
            percentile_line: String::new(),
            participants_line: String::new(),
            user_chart: ChartPanel::new(ChartStyle::USER, chart_size.0, chart_size.1),
            global_chart: ChartPanel::new(ChartStyle::POPULATION, chart_size.0, chart_size.1),
            copy_link: CopyLinkButton::default(),
            has_snapshot: false,
        }
    }

    /// Seeds the population chart on startup; the personal chart gets the
    /// placeholder curve until a trial is submitted. Ignored once a snapshot
    /// has been applied, since the snapshot is newer.
    pub fn apply_global(&mut self, stats: &GlobalStats) {
        if self.has_snapshot {
            debug!("stale global stats ignored");
            return;
        }
        self.participants_line = stats.participants_text();
        let (mean, stdev) = PLACEHOLDER_USER_CURVE;
        self.update_charts(mean, stdev, stats.mean, stats.curve_stdev());
    }

    pub fn apply_snapshot(&mut self, snapshot: &StatsSnapshot) {
        self.has_snapshot = true;
        self.stats_line = snapshot.summary_text();
        self.percentile_line = snapshot.percentile_text();
        self.participants_line = snapshot.participants_text();
        self.update_charts(
            snapshot.mean,
            snapshot.curve_stdev(),
            snapshot.global_mean,
            snapshot.global_curve_stdev(),
        );
    }

    fn update_charts(&mut self, user_mean: f64, user_stdev: f64, global_mean: f64, global_stdev: f64) {
        let font = self.font.as_deref();
        self.user_chart
            .update(distribution_curve(user_mean, user_stdev), font);
        self.global_chart
            .update(distribution_curve(global_mean, global_stdev), font);
        debug!(
            user_mean,
            user_stdev, global_mean, global_stdev, "distribution charts updated"
        );
    }

    pub fn resize_charts(&mut self, chart_size: (u32, u32)) {
        let font = self.font.as_deref();
        self.user_chart.resize(chart_size.0, chart_size.1, font);
        self.global_chart.resize(chart_size.0, chart_size.1, font);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StatsSnapshot {
        StatsSnapshot {
            mean: 350.0,
            stdev: Some(0.0),
            count: 1,
            percentile: 71.4,
            global_mean: 310.0,
            global_stdev: Some(45.0),
            total_users: 9,
        }
    }

    #[test]
    fn copy_confirmation_expires_after_two_seconds() {
        let mut button = CopyLinkButton::default();
        assert_eq!(button.label(0), "Copy Link");
        button.confirm(1_000_000_000);
        assert_eq!(button.label(1_000_000_000), "Link Copied!");
        assert_eq!(button.label(2_999_999_999), "Link Copied!");
        assert_eq!(button.label(3_000_000_000), "Copy Link");
    }

    #[test]
    fn global_stats_seed_population_and_placeholder_curves() {
        let mut board = Dashboard::new(None, (320, 200));
        board.apply_global(&GlobalStats {
            mean: 280.0,
            stdev: None,
            count: 4,
            total_users: 4,
        });
        assert_eq!(board.participants_line, "Number of participants: 4");
        assert!(board.stats_line.is_empty());
        assert!((board.user_chart.curve()[50].x - 500.0).abs() < 1e-9);
        assert!((board.global_chart.curve()[50].x - 284.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_updates_text_and_replaces_both_charts() {
        let mut board = Dashboard::new(None, (320, 200));
        board.apply_snapshot(&snapshot());
        board.apply_snapshot(&snapshot());

        assert_eq!(board.stats_line, "Mean: 350.00 ms  -  Stdev: 0.00  -  Trials: 1");
        assert_eq!(board.percentile_line, "You are in the 71.4th percentile");
        assert_eq!(board.participants_line, "Number of participants: 9");
        assert_eq!(board.user_chart.generation(), 2);
        assert_eq!(board.global_chart.generation(), 2);
        // zero spread is plotted with unit stdev
        assert!((board.user_chart.curve()[50].x - 354.0).abs() < 1e-9);
        assert!(board.user_chart.chart().is_some());
    }

    #[test]
    fn late_global_stats_do_not_override_snapshot() {
        let mut board = Dashboard::new(None, (320, 200));
        board.apply_snapshot(&snapshot());
        board.apply_global(&GlobalStats {
            mean: 280.0,
            stdev: Some(20.0),
            count: 4,
            total_users: 4,
        });

        assert_eq!(board.participants_line, "Number of participants: 9");
        assert_eq!(board.user_chart.generation(), 1);
        assert!((board.user_chart.curve()[50].x - 354.0).abs() < 1e-9);
        assert!((board.global_chart.curve()[50].x - 490.0).abs() < 1e-9);
    }
}
