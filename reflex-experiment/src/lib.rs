pub mod config;
pub mod controller;
pub mod round;

pub use config::{ConfigError, ReactionConfig};
pub use controller::{ControllerEvent, ReactionController};
pub use round::{RoundToken, TimerFired, TimerKind};
