//! Bounded retry policy with backoff schedules
//!
//! Replaces the loop-with-sleep retry idiom with a policy object the
//! coordinator consults between attempts. Only [`Classification::Retryable`]
//! failures consult the policy; rejections and fatal errors bypass it and
//! terminate immediately.

use crate::classify::Classification;
use rand::Rng;
use std::time::Duration;

/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How long to wait before re-running an attempt
///
/// Schedules are monotonically non-decreasing in the attempt number and
/// bounded. `None` exists for deterministic tests; production callers pick
/// `Fixed` or `Exponential`.
#[derive(Debug, Clone, Copy)]
pub enum BackoffSchedule {
    /// No delay between attempts
    None,
    /// The same delay between every pair of attempts
    Fixed(Duration),
    /// Doubling delay from `base`, capped at `cap`, with optional jitter
    ///
    /// With `jitter` set, each delay is drawn uniformly from
    /// `[delay/2, delay]` to decorrelate contending callers.
    Exponential {
        /// Delay before the first retry
        base: Duration,
        /// Upper bound on any single delay
        cap: Duration,
        /// Randomize each delay downward to decorrelate retries
        jitter: bool,
    },
}

impl BackoffSchedule {
    /// Delay before re-running attempt number `attempt` (1-based: the
    /// delay returned for attempt 1 is slept before attempt 2 starts)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            BackoffSchedule::None => Duration::ZERO,
            BackoffSchedule::Fixed(d) => d,
            BackoffSchedule::Exponential { base, cap, jitter } => {
                let mut delay = base;
                for _ in 1..attempt {
                    delay = delay.saturating_mul(2).min(cap);
                }
                delay = delay.min(cap);
                if jitter && !delay.is_zero() {
                    let micros = delay.as_micros() as u64;
                    let drawn = rand::thread_rng().gen_range(micros / 2..=micros);
                    Duration::from_micros(drawn)
                } else {
                    delay
                }
            }
        }
    }
}

/// Bounded-attempt retry policy
///
/// `max_attempts` counts every attempt including the first; the default of
/// 3 matches the convention of the systems this pattern is drawn from.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: BackoffSchedule,
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget and schedule
    ///
    /// An attempt budget of zero is clamped to one: the coordinator always
    /// runs at least one attempt.
    pub fn new(max_attempts: u32, backoff: BackoffSchedule) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Policy with the default budget and no delay, for tests
    pub fn no_backoff() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, BackoffSchedule::None)
    }

    /// The configured attempt budget
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether the coordinator should run another attempt
    ///
    /// `attempt` is the 1-based number of the attempt that just failed.
    /// Only `Retryable` classifications are ever retried.
    pub fn should_retry(&self, attempt: u32, classification: &Classification) -> bool {
        if *classification != Classification::Retryable {
            return false;
        }
        attempt < self.max_attempts
    }

    /// Delay to sleep before the attempt after `attempt`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.delay_for(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            BackoffSchedule::Exponential {
                base: Duration::from_millis(10),
                cap: Duration::from_millis(250),
                jitter: true,
            },
        )
    }
}
