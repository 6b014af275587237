use refhist_core::{CoreError, DescriptorFlags, RefactoringHistory, TimeRange};
use refhist_storage::StorageError;

use crate::scope::Scope;

/// Filter applied to history reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub range: TimeRange,
    pub flags: DescriptorFlags,
    /// Abort a multi-scope read on the first failed scope instead of skipping it.
    pub fail_fast: bool,
}

impl HistoryQuery {
    /// Everything, no flags filter.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: u64, end: u64) -> Result<Self, CoreError> {
        Ok(Self {
            range: TimeRange::new(start, end)?,
            ..Self::default()
        })
    }

    pub fn with_flags(mut self, flags: DescriptorFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}

#[derive(Debug)]
pub struct ScopeFailure {
    pub scope: Scope,
    pub error: StorageError,
}

/// Merged history of several scopes plus the scopes that could not be read.
#[derive(Debug, Default)]
pub struct HistoryReport {
    pub history: RefactoringHistory,
    pub failures: Vec<ScopeFailure>,
}

impl HistoryReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
