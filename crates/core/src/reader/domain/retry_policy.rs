use std::time::Duration;

pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// How long to wait between polls of a source that is not ready, and how
/// many polls to make before giving up.
///
/// Attempts are numbered from 1. `delay_for(n)` is the wait after the n-th
/// failed attempt: `initial_delay * multiplier^(n-1)`, capped at `max_delay`.
/// `max_attempts: None` polls forever.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    /// Constant interval, never gives up.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_delay: interval,
            max_delay: interval,
            multiplier: 1.0,
            max_attempts: None,
        }
    }

    /// Doubling backoff from `initial` up to `max`, at most `max_attempts` attempts.
    pub fn bounded_exponential(max_attempts: u32, initial: Duration, max: Duration) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_attempts: Some(max_attempts),
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some()
    }

    /// Whether attempt number `attempt` may still be made.
    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1);
        if steps == 0 || self.multiplier == 1.0 {
            return self.initial_delay.min(self.max_delay);
        }
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(steps.min(1024) as i32);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("multiplier must be a finite number >= 1");
        }
        if self.initial_delay > self.max_delay {
            return Err("initial delay must not exceed max delay");
        }
        if self.max_attempts == Some(0) {
            return Err("max attempts must be at least 1");
        }
        Ok(())
    }
}
