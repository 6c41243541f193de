use crate::state::{Outcome, TestState};

pub type Rgba = [u8; 4];

pub const COLOR_DEFAULT: Rgba = [0x1e, 0x1e, 0x1e, 255];
pub const COLOR_WAIT: Rgba = [0x8e, 0x16, 0x16, 255];
pub const COLOR_CLICK: Rgba = [0x26, 0x50, 0x95, 255];
pub const COLOR_TOO_SLOW: Rgba = [0x8e, 0x16, 0x16, 255];
pub const COLOR_TOO_EARLY: Rgba = [0xff, 0xa5, 0x00, 255];

/// What the reaction box shows for a given state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxAppearance {
    pub text: String,
    pub color: Rgba,
}

impl TestState {
    pub fn appearance(&self) -> BoxAppearance {
        let (text, color) = match self {
            TestState::Idle => ("Click or press space to start.".to_string(), COLOR_DEFAULT),
            TestState::Waiting => ("Get ready...".to_string(), COLOR_WAIT),
            TestState::Armed => ("CLICK!".to_string(), COLOR_CLICK),
            TestState::Resolved(Outcome::Success { reaction_ms }) => (
                format!("Your time: {reaction_ms} ms. Click or press space to try again."),
                COLOR_CLICK,
            ),
            TestState::Resolved(Outcome::TooEarly) => (
                "Too early! Click or press space to try again.".to_string(),
                COLOR_TOO_EARLY,
            ),
            TestState::Resolved(Outcome::TooSlow) => (
                "Too slow! Click or press space to try again.".to_string(),
                COLOR_TOO_SLOW,
            ),
        };
        BoxAppearance { text, color }
    }
}
