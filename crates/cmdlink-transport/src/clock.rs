//! Monotonic millisecond clocks.
//!
//! The engine consults the clock only while waiting for an acknowledgment,
//! so a clock is cheap to fake: [`ManualClock`] lets tests drive time
//! explicitly instead of sleeping.

use std::cell::Cell;
use std::time::Instant;

/// A monotonic millisecond counter.
pub trait Clock {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_millis(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u64 {
        (**self).now_millis()
    }
}

/// Wall-independent clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Clock that only moves when told to.
///
/// With a non-zero `step`, every query returns the current time and then
/// advances it by `step` milliseconds, which turns a polling loop into a
/// deterministic sequence of ticks.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
    step: u64,
}

impl ManualClock {
    /// A clock frozen at `start` until [`advance`](Self::advance) or [`set`](Self::set).
    pub fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
            step: 0,
        }
    }

    /// A clock that advances by `step` milliseconds after every query.
    pub fn stepping(start: u64, step: u64) -> Self {
        Self {
            now: Cell::new(start),
            step,
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    pub fn set(&self, millis: u64) {
        self.now.set(millis);
    }

    /// Current time without ticking.
    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step));
        now
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_millis(), 10);
        assert_eq!(clock.now_millis(), 10);

        clock.advance(15);
        assert_eq!(clock.now_millis(), 25);

        clock.set(3);
        assert_eq!(clock.peek(), 3);
    }

    #[test]
    fn test_stepping_clock_ticks_per_query() {
        let clock = ManualClock::stepping(0, 5);
        assert_eq!(clock.now_millis(), 0);
        assert_eq!(clock.now_millis(), 5);
        assert_eq!(clock.now_millis(), 10);
        assert_eq!(clock.peek(), 15);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now_millis();
        std::thread::sleep(Duration::from_millis(5));
        let second = clock.now_millis();
        assert!(second >= first + 5);
    }

    #[test]
    fn test_clock_by_reference() {
        fn read<C: Clock>(clock: C) -> u64 {
            clock.now_millis()
        }
        let clock = ManualClock::new(42);
        assert_eq!(read(&clock), 42);
    }
}
