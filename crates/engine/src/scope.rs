use std::fmt;
use std::path::{Path, PathBuf};

use refhist_storage::{NAME_HISTORY_FOLDER, NAME_WORKSPACE_PROJECT};

/// Partition of the persisted history.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Workspace,
    Project(String),
}

impl Scope {
    /// Scope of a descriptor or proxy; a missing or empty project is the workspace.
    pub fn of(project: Option<&str>) -> Self {
        match project {
            Some(name) if !name.is_empty() => Scope::Project(name.to_string()),
            _ => Scope::Workspace,
        }
    }

    pub fn project(&self) -> Option<&str> {
        match self {
            Scope::Workspace => None,
            Scope::Project(name) => Some(name),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Workspace => f.write_str(NAME_WORKSPACE_PROJECT),
            Scope::Project(name) => f.write_str(name),
        }
    }
}

/// Project-level resource facts owned by the workspace.
pub trait Workspace: Send + Sync {
    /// Every project, open or closed.
    fn projects(&self) -> Vec<String>;

    fn exists(&self, project: &str) -> bool;

    /// Exists and is open.
    fn is_accessible(&self, project: &str) -> bool;

    /// File-system location of the project, if it has one.
    fn location(&self, project: &str) -> Option<PathBuf>;
}

/// Whether a project keeps its history inside its own folder.
pub trait ScopePolicy: Send + Sync {
    fn is_local(&self, project: &str) -> bool;

    fn set_local(&self, project: &str, enabled: bool);
}

/// A resolved storage location plus the project name its manager is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeLocation {
    pub path: PathBuf,
    pub project: Option<String>,
}

/// Shared history folders under the state location.
#[derive(Debug, Clone)]
pub struct HistoryLocations {
    root: PathBuf,
}

impl HistoryLocations {
    pub fn new(state_location: &Path) -> Self {
        Self {
            root: state_location.join(NAME_HISTORY_FOLDER),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace-relative folder keyed by project name.
    pub fn shared(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    pub fn workspace(&self) -> PathBuf {
        self.root.join(NAME_WORKSPACE_PROJECT)
    }

    pub fn local(project_location: &Path) -> PathBuf {
        project_location.join(NAME_HISTORY_FOLDER)
    }

    /// Where `scope` is stored, or `None` when the project is inaccessible
    /// (or local without a file-system location).
    pub fn resolve(
        &self,
        scope: &Scope,
        workspace: &dyn Workspace,
        policy: &dyn ScopePolicy,
    ) -> Option<ScopeLocation> {
        match scope {
            Scope::Workspace => Some(ScopeLocation {
                path: self.workspace(),
                project: None,
            }),
            Scope::Project(name) => {
                if !workspace.is_accessible(name) {
                    return None;
                }
                let path = if policy.is_local(name) {
                    Self::local(&workspace.location(name)?)
                } else {
                    self.shared(name)
                };
                Some(ScopeLocation {
                    path,
                    project: Some(name.clone()),
                })
            }
        }
    }
}
