//! Wall-clock sources used for `exp` injection and expiration windows.
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time, in whole seconds.
///
/// Services hold one behind an `Arc`, so tests can pin "now" with [`FixedClock`].
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time as whole Unix seconds.
    fn now_seconds(&self) -> i64;
}

/// Reads `SystemTime::now()`; times before the epoch read as 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> i64 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}

/// A clock frozen at a given Unix second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_seconds(&self) -> i64 {
        self.0
    }
}
