/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success { reaction_ms: u64 },
    TooEarly,
    TooSlow,
}

/// Interaction state of the reaction box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestState {
    #[default]
    Idle,
    Waiting,
    Armed,
    Resolved(Outcome),
}

/// User input routed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Click,
    Space,
    OtherKey,
}

impl InputEvent {
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Click | Self::Space)
    }
}
