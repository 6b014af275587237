use refhist_engine::{ScopePolicy, Workspace};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct ProjectEntry {
    open: bool,
    location: Option<PathBuf>,
    local: bool,
}

/// In-memory projects with open/closed state and optional folders.
///
/// Doubles as the per-project storage-mode preference.
#[derive(Default)]
pub struct TestWorkspace {
    projects: Mutex<BTreeMap<String, ProjectEntry>>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ProjectEntry>> {
        match self.projects.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Adds an open project located at `location`.
    pub fn add_project(&self, name: &str, location: Option<PathBuf>) {
        self.lock().insert(
            name.to_string(),
            ProjectEntry {
                open: true,
                location,
                local: false,
            },
        );
    }

    pub fn set_open(&self, name: &str, open: bool) {
        if let Some(entry) = self.lock().get_mut(name) {
            entry.open = open;
        }
    }

    pub fn remove_project(&self, name: &str) {
        self.lock().remove(name);
    }
}

impl Workspace for TestWorkspace {
    fn projects(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn exists(&self, project: &str) -> bool {
        self.lock().contains_key(project)
    }

    fn is_accessible(&self, project: &str) -> bool {
        self.lock().get(project).is_some_and(|entry| entry.open)
    }

    fn location(&self, project: &str) -> Option<PathBuf> {
        self.lock().get(project).and_then(|entry| entry.location.clone())
    }
}

impl ScopePolicy for TestWorkspace {
    fn is_local(&self, project: &str) -> bool {
        self.lock().get(project).is_some_and(|entry| entry.local)
    }

    fn set_local(&self, project: &str, enabled: bool) {
        if let Some(entry) = self.lock().get_mut(project) {
            entry.local = enabled;
        }
    }
}
