use std::path::PathBuf;

use serde::Deserialize;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::undo::MAX_UNDO_STACK;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Root under which shared (non project-local) history folders live.
    pub state_location: PathBuf,
    pub undo_capacity: usize,
    pub cache_capacity: usize,
    /// Write performed refactorings to their scope's log, and drop them again on undo.
    pub persist_performed: bool,
}

impl CoordinatorConfig {
    pub fn new(state_location: impl Into<PathBuf>) -> Self {
        Self {
            state_location: state_location.into(),
            ..Self::default()
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            state_location: PathBuf::from("."),
            undo_capacity: MAX_UNDO_STACK,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            persist_performed: true,
        }
    }
}
