pub mod schedule;
pub mod stopwatch;
pub mod timer;

pub use schedule::{Scheduled, TimerQueue};
pub use stopwatch::Stopwatch;
pub use timer::{FrameStats, HighPrecisionTimer, ManualTimer, Timer};
