use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Decides whether a slower task is due on this tick
pub struct TaskScheduler {
    interval: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl TaskScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: Mutex::new(None),
        }
    }

    /// True on the first call and then once per interval
    pub fn should_run(&self) -> bool {
        let now = Instant::now();
        let mut last_run = self.last_run.lock();
        match *last_run {
            Some(previous) if now.duration_since(previous) < self.interval => false,
            _ => {
                *last_run = Some(now);
                true
            }
        }
    }

    pub fn reset(&self) {
        *self.last_run.lock() = None;
    }

    pub fn time_until_next_run(&self) -> Duration {
        match *self.last_run.lock() {
            Some(previous) => self.interval.saturating_sub(previous.elapsed()),
            None => Duration::ZERO,
        }
    }
}
