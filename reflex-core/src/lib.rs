pub mod appearance;
pub mod distribution;
pub mod state;
pub mod stats;
pub mod trial;

pub use appearance::{BoxAppearance, Rgba};
pub use distribution::{distribution_curve, normal_cdf, normal_pdf, CurvePoint};
pub use state::{InputEvent, Outcome, TestState};
pub use stats::{GlobalStats, StatsSnapshot};
pub use trial::TrialResult;
