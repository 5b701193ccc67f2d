//! Clocks

use std::cell::Cell;

use jiff::{SignedDuration, Timestamp};

/// Source of the current time for `added_at` stamps.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Manually driven clock, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Cell<Timestamp>,
}

impl FixedClock {
    /// Create a clock stopped at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Move the clock forward by `by`, saturating at the maximum timestamp.
    pub fn advance(&self, by: SignedDuration) {
        let current = self.now.get();
        self.now
            .set(current.checked_add(by).unwrap_or(Timestamp::MAX));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(Timestamp::UNIX_EPOCH);

        clock.advance(SignedDuration::from_secs(90));

        assert_eq!(clock.now().as_second(), 90);
    }
}
