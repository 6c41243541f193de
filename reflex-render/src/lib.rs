pub mod chart;
pub mod dashboard;
pub mod screen;
pub mod text;

pub use chart::{ChartPanel, ChartStyle, DistributionChart};
pub use dashboard::{CopyLinkButton, Dashboard};
pub use screen::{HitTarget, Layout, ScreenRenderer};
pub use text::{load_font, TextCache};
