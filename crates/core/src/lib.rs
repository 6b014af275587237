pub mod clock;
pub mod descriptor;
pub mod error;
pub mod flags;
pub mod history;
pub mod monitor;
pub mod proxy;
pub mod range;

pub use clock::StampClock;
pub use descriptor::{RefactoringDescriptor, UNKNOWN_REFACTORING_ID};
pub use error::CoreError;
pub use flags::DescriptorFlags;
pub use history::RefactoringHistory;
pub use monitor::{CancellationToken, Outcome, ProgressMonitor};
pub use proxy::DescriptorProxy;
pub use range::TimeRange;
