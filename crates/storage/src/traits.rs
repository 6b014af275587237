use std::path::Path;

use refhist_core::{DescriptorFlags, RefactoringDescriptor, RefactoringHistory, TimeRange};

use crate::error::StorageError;

/// Folder holding a history log, both under the shared state root and inside a project.
pub const NAME_HISTORY_FOLDER: &str = ".refactorings";

/// File name of the log inside a history folder.
pub const NAME_HISTORY_FILE: &str = "refactorings.history";

/// Pseudo-project name of the workspace-level log.
pub const NAME_WORKSPACE_PROJECT: &str = ".workspace";

/// The persisted log of one scope, bound to a single location.
pub trait HistoryStore: Send {
    fn location(&self) -> &Path;

    /// `None` for the workspace-level log.
    fn project(&self) -> Option<&str>;

    /// Proxies of every stored descriptor with a stamp in `range` passing
    /// `filter`, newest first.
    fn read_history(
        &mut self,
        range: TimeRange,
        filter: DescriptorFlags,
    ) -> Result<RefactoringHistory, StorageError>;

    fn request_descriptor(
        &mut self,
        timestamp: u64,
    ) -> Result<Option<RefactoringDescriptor>, StorageError>;

    /// Stores `descriptor`. An entry with the same stamp is never replaced;
    /// that fails with [`StorageError::DuplicateTimestamp`].
    fn add_descriptor(&mut self, descriptor: &RefactoringDescriptor) -> Result<(), StorageError>;

    /// Newest stamp in the log, `None` when it holds nothing.
    fn latest_timestamp(&mut self) -> Result<Option<u64>, StorageError>;

    /// Returns the number of entries removed.
    fn remove_descriptors(&mut self, timestamps: &[u64]) -> Result<usize, StorageError>;
}

/// Opens stores and manages the locations they live at.
pub trait StoreProvider: Send + Sync {
    fn open(
        &self,
        location: &Path,
        project: Option<&str>,
    ) -> Result<Box<dyn HistoryStore>, StorageError>;

    fn exists(&self, location: &Path) -> bool;

    /// Deletes the log at `location`. Deleting a missing log is not an error.
    fn delete(&self, location: &Path) -> Result<(), StorageError>;

    /// Moves the log at `from` to `to`, replacing whatever `to` held.
    /// Returns `false` when there was nothing to move.
    fn relocate(&self, from: &Path, to: &Path) -> Result<bool, StorageError>;
}
