//! Validity intervals for the `exp` claim.
use std::time::Duration;

use crate::time::{Clock, SystemClock};

/// An optionally bounded interval of Unix seconds, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpirationWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

fn secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

impl ExpirationWindow {
    pub const fn new(start: Option<i64>, end: Option<i64>) -> Self {
        Self { start, end }
    }

    /// Contains every timestamp.
    pub const fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// `[start, start + duration]`.
    pub fn start_until(start: i64, duration: Duration) -> Self {
        Self::new(Some(start), Some(start.saturating_add(secs(duration))))
    }

    /// `[end - duration, end]`.
    pub fn duration_to(duration: Duration, end: i64) -> Self {
        Self::new(Some(end.saturating_sub(secs(duration))), Some(end))
    }

    /// `[now, now + duration]` on the system clock.
    pub fn from_now(duration: Duration) -> Self {
        Self::from_now_at(&SystemClock, duration)
    }

    pub fn from_now_at(clock: &dyn Clock, duration: Duration) -> Self {
        Self::start_until(clock.now_seconds(), duration)
    }

    /// `[now, ∞)` on the system clock: rejects anything already expired.
    pub fn starting_now() -> Self {
        Self::starting_at(&SystemClock)
    }

    pub fn starting_at(clock: &dyn Clock) -> Self {
        Self::new(Some(clock.now_seconds()), None)
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        if let Some(start) = self.start {
            if timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp > end {
                return false;
            }
        }
        true
    }
}
