/// A one-shot timer waiting for its deadline.
///
/// `token` identifies the round that scheduled it; whoever fires the timer
/// compares it with the live round before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled<K> {
    pub kind: K,
    pub token: u64,
    pub due_ns: u64,
}

/// Pending one-shot timers, at most one per kind
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    pending: Vec<Scheduled<K>>,
}

impl<K: Copy + PartialEq> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(2),
        }
    }

    /// Schedules `kind`, replacing any pending timer of the same kind.
    pub fn schedule(&mut self, kind: K, token: u64, due_ns: u64) {
        self.cancel(kind);
        self.pending.push(Scheduled {
            kind,
            token,
            due_ns,
        });
    }

    fn cancel(&mut self, kind: K) {
        self.pending.retain(|s| s.kind != kind);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|s| s.due_ns).min()
    }

    /// Removes and returns the earliest timer whose deadline is at or before
    /// `now_ns`.
    pub fn pop_due(&mut self, now_ns: u64) -> Option<Scheduled<K>> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ns <= now_ns)
            .min_by_key(|(_, s)| s.due_ns)
            .map(|(i, _)| i)?;
        Some(self.pending.swap_remove(idx))
    }
}

impl<K: Copy + PartialEq> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn keeps_one_timer_per_kind() {
        let mut queue = TimerQueue::new();
        queue.schedule(Kind::A, 1, 100);
        queue.schedule(Kind::A, 2, 50);
        assert_eq!(queue.next_due(), Some(50));
        let fired = queue.pop_due(60).unwrap();
        assert_eq!(fired.token, 2);
        assert_eq!(queue.pop_due(u64::MAX), None);
    }

    #[test]
    fn pops_in_deadline_order_only_when_due() {
        let mut queue = TimerQueue::new();
        queue.schedule(Kind::B, 1, 300);
        queue.schedule(Kind::A, 1, 200);
        assert_eq!(queue.pop_due(199), None);
        assert_eq!(queue.pop_due(500).map(|s| s.kind), Some(Kind::A));
        assert_eq!(queue.pop_due(500).map(|s| s.kind), Some(Kind::B));
        assert_eq!(queue.next_due(), None);
    }

    #[test]
    fn cancel_all_drops_everything() {
        let mut queue = TimerQueue::new();
        queue.schedule(Kind::A, 3, 10);
        queue.schedule(Kind::B, 3, 20);
        queue.cancel_all();
        assert_eq!(queue.next_due(), None);
        assert_eq!(queue.pop_due(u64::MAX), None);
    }

    #[test]
    fn cancel_removes_only_that_kind() {
        let mut queue = TimerQueue::new();
        queue.schedule(Kind::A, 1, 10);
        queue.schedule(Kind::B, 1, 20);
        queue.cancel(Kind::A);
        assert_eq!(queue.next_due(), Some(20));
        assert_eq!(queue.pop_due(u64::MAX).map(|s| s.kind), Some(Kind::B));
    }
}
