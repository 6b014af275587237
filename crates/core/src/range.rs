use crate::CoreError;

/// Inclusive `[start, end]` range of perform-time stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: u64,
    end: u64,
}

impl TimeRange {
    pub const ALL: TimeRange = TimeRange { start: 0, end: u64::MAX };

    pub fn new(start: u64, end: u64) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::ALL
    }
}
