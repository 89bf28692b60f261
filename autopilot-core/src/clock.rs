use std::{
    sync::Mutex,
    thread,
    time::{Duration, Instant},
};

/// Source of time for the driver, injectable so tests never sleep.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Test clock: `sleep` advances time instantly.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// When the driver last acted on its own. Both detectors read these to gate
/// how often they may fire; only the driver writes them, after a send succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    pub last_response: Instant,
    pub last_auto_prompt: Instant,
}

impl Cooldowns {
    pub fn new(now: Instant) -> Self {
        Self {
            last_response: now,
            last_auto_prompt: now,
        }
    }

    pub fn since_response(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_response)
    }

    pub fn since_auto_prompt(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_auto_prompt)
    }

    /// Time since whichever automatic action happened most recently.
    pub fn idle_for(&self, now: Instant) -> Duration {
        self.since_response(now).min(self.since_auto_prompt(now))
    }

    pub fn record_response(&mut self, now: Instant) {
        self.last_response = now;
    }

    /// An auto-prompt counts as a response too, so a freshly prompted session
    /// is not immediately prompted again.
    pub fn record_auto_prompt(&mut self, now: Instant) {
        self.last_auto_prompt = now;
        self.last_response = now;
    }
}
