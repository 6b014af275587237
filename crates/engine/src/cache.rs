use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use refhist_storage::{HistoryStore, StorageError, StoreProvider};

pub const DEFAULT_CACHE_CAPACITY: usize = 2;

/// Live history managers keyed by location, least recently used evicted first.
///
/// Eviction only drops the in-memory handle; the log it was bound to stays on disk.
pub struct ManagerCache {
    provider: Arc<dyn StoreProvider>,
    entries: LruCache<PathBuf, Box<dyn HistoryStore>>,
}

impl ManagerCache {
    pub fn new(provider: Arc<dyn StoreProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the manager for `location`, opening one on a miss.
    /// Either way the entry becomes the most recently used.
    pub fn get(
        &mut self,
        location: &Path,
        project: Option<&str>,
    ) -> Result<&mut dyn HistoryStore, StorageError> {
        let candidate = match self.entries.peek_lru() {
            Some((lru, _)) if self.entries.len() == self.capacity() && !self.entries.contains(location) => {
                Some(lru.clone())
            }
            _ => None,
        };
        let provider = &self.provider;
        let store = self
            .entries
            .try_get_or_insert_mut(location.to_path_buf(), || provider.open(location, project))?;
        if let Some(evicted) = candidate {
            debug!(location = %evicted.display(), "evicted history manager");
        }
        Ok(store.as_mut())
    }

    /// Drops the cached manager for `location`, if any.
    pub fn evict(&mut self, location: &Path) -> bool {
        self.entries.pop(location).is_some()
    }

    pub fn contains(&self, location: &Path) -> bool {
        self.entries.contains(location)
    }

    /// Cached locations, most recently used first.
    pub fn locations(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|(location, _)| location.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
