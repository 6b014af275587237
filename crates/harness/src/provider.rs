use refhist_storage::{HistoryStore, SqliteStoreProvider, StorageError, StoreProvider};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// SQLite-backed provider that records every open and can be told to fail
/// chosen locations.
#[derive(Default)]
pub struct TestProvider {
    inner: SqliteStoreProvider,
    opened: Mutex<Vec<PathBuf>>,
    failing: Mutex<HashSet<PathBuf>>,
}

impl TestProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every location opened so far, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        lock(&self.opened).clone()
    }

    pub fn open_count(&self, location: &Path) -> usize {
        lock(&self.opened).iter().filter(|l| l.as_path() == location).count()
    }

    /// Opens and deletes of `location` fail from now on.
    pub fn fail_location(&self, location: impl Into<PathBuf>) {
        lock(&self.failing).insert(location.into());
    }

    pub fn heal_location(&self, location: &Path) {
        lock(&self.failing).remove(location);
    }

    fn check(&self, location: &Path) -> Result<(), StorageError> {
        if lock(&self.failing).contains(location) {
            return Err(StorageError::Io(io::Error::other(format!(
                "injected failure at {}",
                location.display()
            ))));
        }
        Ok(())
    }
}

impl StoreProvider for TestProvider {
    fn open(&self, location: &Path, project: Option<&str>) -> Result<Box<dyn HistoryStore>, StorageError> {
        self.check(location)?;
        let store = self.inner.open(location, project)?;
        lock(&self.opened).push(location.to_path_buf());
        Ok(store)
    }

    fn exists(&self, location: &Path) -> bool {
        self.inner.exists(location)
    }

    fn delete(&self, location: &Path) -> Result<(), StorageError> {
        self.check(location)?;
        self.inner.delete(location)
    }

    fn relocate(&self, from: &Path, to: &Path) -> Result<bool, StorageError> {
        self.check(from)?;
        self.check(to)?;
        self.inner.relocate(from, to)
    }
}
