use crate::timer::NANOS_PER_MILLI;

/// Single-use reaction measurement. Once stopped it never yields a second
/// reading until restarted.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    started_ns: Option<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now_ns: u64) {
        self.started_ns = Some(now_ns);
    }

    /// Elapsed whole milliseconds since `start`, rounded to nearest.
    pub fn stop(&mut self, now_ns: u64) -> Option<u64> {
        let started = self.started_ns.take()?;
        let elapsed = now_ns.saturating_sub(started);
        Some((elapsed + NANOS_PER_MILLI / 2) / NANOS_PER_MILLI)
    }

    pub fn reset(&mut self) {
        self.started_ns = None;
    }
}
