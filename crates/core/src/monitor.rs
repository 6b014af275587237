//! Progress reporting and cooperative cancellation for slow history calls.
//!
//! Every read, write and delete on the coordinator takes a [`ProgressMonitor`].
//! Cancellation is polled between steps and surfaces as
//! [`Outcome::Cancelled`], never as an error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer of a long-running history call.
pub trait ProgressMonitor: Send + Sync {
    /// Polled between steps; returning `true` stops the call early.
    fn is_cancelled(&self) -> bool;

    fn begin_task(&self, _name: &str, _total_work: usize) {}

    fn worked(&self, _units: usize) {}

    fn done(&self) {}
}

/// Thread-safe, cloneable cancellation flag usable as a monitor.
///
/// Clones share state: cancelling any clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl ProgressMonitor for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

/// Result of a call that may be cancelled part-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Completed(value) => Outcome::Completed(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}
