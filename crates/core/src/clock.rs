use std::time::{SystemTime, UNIX_EPOCH};

use crate::CoreError;

/// Returns the current wall-clock time as milliseconds since Unix epoch.
pub fn physical_now() -> Result<u64, CoreError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|_| CoreError::InvalidData("system clock before epoch".into()))
}

/// Assigns perform-time stamps to descriptors.
///
/// Stamps are wall-clock milliseconds, bumped by one whenever the wall clock
/// has not advanced past the previous stamp, so two refactorings performed
/// within the same millisecond still get distinct, increasing stamps.
pub struct StampClock {
    last: u64,
}

impl StampClock {
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// Generate the next strictly increasing stamp.
    pub fn tick(&mut self) -> Result<u64, CoreError> {
        let now = physical_now()?;
        let stamp = if now > self.last { now } else { self.last + 1 };
        self.last = stamp;
        Ok(stamp)
    }

    /// Make sure future stamps sort after `stamp`, e.g. one read back from disk.
    pub fn observe(&mut self, stamp: u64) {
        if stamp > self.last {
            self.last = stamp;
        }
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

impl Default for StampClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_monotonicity() {
        let mut clock = StampClock::new();
        let mut prev = clock.tick().unwrap();
        for _ in 0..100 {
            let next = clock.tick().unwrap();
            assert!(next > prev, "expected {next} > {prev}");
            prev = next;
        }
    }

    #[test]
    fn stalled_wall_clock_still_increments() {
        let mut clock = StampClock::new();
        let future = physical_now().unwrap() + 100_000;
        clock.observe(future);

        assert_eq!(clock.tick().unwrap(), future + 1);
        assert_eq!(clock.tick().unwrap(), future + 2);
        assert_eq!(clock.last(), future + 2);
    }

    #[test]
    fn observe_never_moves_backwards() {
        let mut clock = StampClock::new();
        clock.observe(500);
        clock.observe(100);
        assert_eq!(clock.last(), 500);
    }
}
