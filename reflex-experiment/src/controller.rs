use super::config::ReactionConfig;
use super::round::{RoundToken, TimerFired, TimerKind};
use rand::Rng;
use reflex_core::{BoxAppearance, InputEvent, Outcome, TestState, TrialResult};
use reflex_timing::timer::NANOS_PER_MILLI;
use reflex_timing::{Stopwatch, Timer, TimerQueue};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    RoundStarted { token: RoundToken, arm_delay_ms: u64 },
    Armed { token: RoundToken },
    Resolved { token: RoundToken, outcome: Outcome },
    Submit(TrialResult),
}

/// Owns the interaction state of the reaction box.
///
/// Inputs go through [`handle_input`](Self::handle_input), timer callbacks
/// through [`update`](Self::update) or [`fire`](Self::fire). Nothing else
/// mutates the state, so a stale callback can at worst be ignored.
pub struct ReactionController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ReactionConfig,
    timer: T,
    rng: R,
    state: TestState,
    token: RoundToken,
    timers: TimerQueue<TimerKind>,
    stopwatch: Stopwatch,
    rounds_started: usize,
}

impl<T, R> ReactionController<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: ReactionConfig, timer: T, rng: R) -> Self {
        Self {
            config,
            timer,
            rng,
            state: TestState::Idle,
            token: RoundToken::default(),
            timers: TimerQueue::new(),
            stopwatch: Stopwatch::new(),
            rounds_started: 0,
        }
    }

    /// Routes a click or key press according to the current state.
    pub fn handle_input(&mut self, input: InputEvent) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        if !input.is_response() {
            return events;
        }

        match self.state {
            TestState::Idle | TestState::Resolved(_) => self.start_test(&mut events),
            TestState::Waiting => self.resolve(Outcome::TooEarly, &mut events),
            TestState::Armed => self.record_response(&mut events),
        }
        events
    }

    /// Fires every timer whose deadline has passed.
    pub fn update(&mut self) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        let now_ns = self.timer.now();
        while let Some(due) = self.timers.pop_due(now_ns) {
            self.fire_into(
                TimerFired {
                    kind: due.kind,
                    token: RoundToken(due.token),
                },
                &mut events,
            );
        }
        events
    }

    /// Delivers a single timer callback.
    pub fn fire(&mut self, fired: TimerFired) -> Vec<ControllerEvent> {
        let mut events = Vec::new();
        self.fire_into(fired, &mut events);
        events
    }

    fn fire_into(&mut self, fired: TimerFired, events: &mut Vec<ControllerEvent>) {
        if fired.token != self.token {
            debug!(?fired, current = ?self.token, "stale timer ignored");
            return;
        }

        match (fired.kind, self.state) {
            (TimerKind::Arm, TestState::Waiting) => self.arm(events),
            (TimerKind::Timeout, TestState::Armed) => self.resolve(Outcome::TooSlow, events),
            (kind, state) => debug!(?kind, ?state, "timer does not apply to state"),
        }
    }

    fn start_test(&mut self, events: &mut Vec<ControllerEvent>) {
        self.timers.cancel_all();
        self.stopwatch.reset();
        self.token = self.token.next();
        self.rounds_started += 1;

        let arm_delay_ms = self.draw_arm_delay();
        let due = self.timer.now() + arm_delay_ms * NANOS_PER_MILLI;
        self.timers.schedule(TimerKind::Arm, self.token.0, due);
        self.state = TestState::Waiting;

        info!(token = self.token.0, arm_delay_ms, "round started");
        events.push(ControllerEvent::RoundStarted {
            token: self.token,
            arm_delay_ms,
        });
    }

    fn arm(&mut self, events: &mut Vec<ControllerEvent>) {
        let now_ns = self.timer.now();
        self.stopwatch.start(now_ns);
        self.timers.schedule(
            TimerKind::Timeout,
            self.token.0,
            now_ns + self.config.response_timeout_ms * NANOS_PER_MILLI,
        );
        self.state = TestState::Armed;

        debug!(token = self.token.0, at_ns = now_ns, "box armed");
        events.push(ControllerEvent::Armed { token: self.token });
    }

    fn record_response(&mut self, events: &mut Vec<ControllerEvent>) {
        let now_ns = self.timer.now();
        let Some(reaction_ms) = self.stopwatch.stop(now_ns) else {
            warn!(token = self.token.0, "armed without a running stopwatch");
            return;
        };

        self.resolve(Outcome::Success { reaction_ms }, events);
        events.push(ControllerEvent::Submit(TrialResult::new(reaction_ms)));
    }

    fn resolve(&mut self, outcome: Outcome, events: &mut Vec<ControllerEvent>) {
        self.timers.cancel_all();
        self.stopwatch.reset();
        self.state = TestState::Resolved(outcome);

        info!(token = self.token.0, ?outcome, "round resolved");
        events.push(ControllerEvent::Resolved {
            token: self.token,
            outcome,
        });
    }

    fn draw_arm_delay(&mut self) -> u64 {
        let (min, max) = (self.config.arm_delay_min_ms, self.config.arm_delay_max_ms);
        if min >= max {
            min
        } else {
            self.rng.random_range(min..max)
        }
    }

    pub fn state(&self) -> TestState {
        self.state
    }

    pub fn appearance(&self) -> BoxAppearance {
        self.state.appearance()
    }

    pub fn round_token(&self) -> RoundToken {
        self.token
    }

    pub fn rounds_started(&self) -> usize {
        self.rounds_started
    }

    /// Earliest pending timer deadline, in timer nanoseconds.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }
}
