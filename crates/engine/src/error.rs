use refhist_core::CoreError;
use refhist_storage::StorageError;
use thiserror::Error;

use crate::scope::Scope;
use crate::undo::EmptyStackError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("history coordinator is not connected")]
    NotConnected,

    #[error("project unavailable: {0}")]
    ProjectUnavailable(String),

    #[error("contract violation: {0}")]
    Contract(#[from] EmptyStackError),

    #[error("history of {scope} unreadable: {source}")]
    ScopeFailed {
        scope: Scope,
        #[source]
        source: StorageError,
    },
}
