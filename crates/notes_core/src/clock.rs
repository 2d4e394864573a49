//! Time source capability for note timestamps.
//!
//! # Responsibility
//! - Provide epoch-millisecond timestamps to the note store.
//! - Allow tests to drive time deterministically.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in Unix epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        // A clock set before the epoch is reported as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Manually driven clock.
///
/// Every `now_ms` call returns the current value and then advances it by
/// `step_ms`, so consecutive mutations get distinct timestamps.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Cell<i64>,
    step_ms: i64,
}

impl ManualClock {
    /// Clock frozen at `start_ms`.
    pub fn fixed(start_ms: i64) -> Self {
        Self::stepping(start_ms, 0)
    }

    /// Clock starting at `start_ms` and advancing `step_ms` per reading.
    pub fn stepping(start_ms: i64, step_ms: i64) -> Self {
        Self {
            now: Cell::new(start_ms),
            step_ms,
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        let current = self.now.get();
        self.now.set(current + self.step_ms);
        current
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}
