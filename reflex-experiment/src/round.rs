/// Identifies one round. Every new round gets a fresh token, and timer
/// callbacks scheduled under an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoundToken(pub u64);

impl RoundToken {
    pub fn next(self) -> Self {
        RoundToken(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Random delay elapsed, the box turns active.
    Arm,
    /// No response arrived in time.
    Timeout,
}

/// A timer callback as delivered to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    pub token: RoundToken,
}
