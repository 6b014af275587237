use crate::{EventRecorder, OperationBus, TestProvider, TestWorkspace};
use refhist_core::{DescriptorFlags, DescriptorProxy, RefactoringDescriptor};
use refhist_engine::{
    Collaborators, CoordinatorConfig, ExecutionListener, HistoryCoordinator, HistoryListener,
    HistoryLocations, OperationEvent, ResourceEvent, Workspace,
};
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A connected coordinator wired to an in-memory workspace, an operation
/// bus and SQLite logs under temporary directories.
pub struct TestBench {
    pub coordinator: HistoryCoordinator,
    pub workspace: Arc<TestWorkspace>,
    pub bus: Arc<OperationBus>,
    pub provider: Arc<TestProvider>,
    pub recorder: Arc<EventRecorder>,
    state: TempDir,
    projects: TempDir,
}

impl TestBench {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        Self::with_config(|_| {})
    }

    /// Builds a bench after letting `configure` adjust the default config.
    /// The state location is always the bench's temporary directory.
    pub fn with_config(configure: impl FnOnce(&mut CoordinatorConfig)) -> Result<Self, Box<dyn Error>> {
        let state = TempDir::new()?;
        let projects = TempDir::new()?;
        let mut config = CoordinatorConfig::default();
        configure(&mut config);
        config.state_location = state.path().to_path_buf();

        let workspace = Arc::new(TestWorkspace::new());
        let bus = Arc::new(OperationBus::new());
        let provider = Arc::new(TestProvider::new());
        let coordinator = HistoryCoordinator::new(
            config,
            Collaborators {
                provider: provider.clone(),
                workspace: workspace.clone(),
                policy: workspace.clone(),
                notifications: Some(bus.clone()),
            },
        );
        let recorder = Arc::new(EventRecorder::new());
        let execution: Arc<dyn ExecutionListener> = recorder.clone();
        let history: Arc<dyn HistoryListener> = recorder.clone();
        coordinator.add_execution_listener(execution);
        coordinator.add_history_listener(history);
        coordinator.connect();

        Ok(Self {
            coordinator,
            workspace,
            bus,
            provider,
            recorder,
            state,
            projects,
        })
    }

    pub fn state_location(&self) -> &Path {
        self.state.path()
    }

    /// Adds an open project with its own folder and returns that folder.
    pub fn add_project(&self, name: &str) -> Result<PathBuf, Box<dyn Error>> {
        let location = self.projects.path().join(name);
        std::fs::create_dir_all(&location)?;
        self.workspace.add_project(name, Some(location.clone()));
        Ok(location)
    }

    pub fn shared_location(&self, project: &str) -> PathBuf {
        self.coordinator.locations().shared(project)
    }

    pub fn local_location(&self, project: &str) -> Option<PathBuf> {
        self.workspace
            .location(project)
            .map(|location| HistoryLocations::local(&location))
    }

    /// Executes `descriptor` through the bus and returns the pushed proxy.
    pub fn perform(&self, descriptor: RefactoringDescriptor) -> Result<DescriptorProxy, Box<dyn Error>> {
        self.bus.emit_operation(OperationEvent::AboutToExecute(Some(descriptor)));
        self.finish_perform()
    }

    /// Executes an operation that carries no descriptor.
    pub fn perform_unknown(&self) -> Result<DescriptorProxy, Box<dyn Error>> {
        self.bus.emit_operation(OperationEvent::AboutToExecute(None));
        self.finish_perform()
    }

    fn finish_perform(&self) -> Result<DescriptorProxy, Box<dyn Error>> {
        self.bus.emit_operation(OperationEvent::Done);
        let top = self.coordinator.peek_undo()?.ok_or("nothing pushed")?;
        Ok(top.proxy())
    }

    pub fn undo(&self) {
        self.bus.emit_operation(OperationEvent::AboutToUndo);
        self.bus.emit_operation(OperationEvent::Undone);
    }

    pub fn redo(&self) {
        self.bus.emit_operation(OperationEvent::AboutToRedo);
        self.bus.emit_operation(OperationEvent::Redone);
    }

    pub fn close_project(&self, name: &str) {
        self.bus
            .emit_resource(ResourceEvent::ProjectAboutToBeClosed(name.to_string()));
        self.workspace.set_open(name, false);
    }

    pub fn delete_project(&self, name: &str) {
        self.bus
            .emit_resource(ResourceEvent::ProjectAboutToBeDeleted(name.to_string()));
        self.workspace.remove_project(name);
    }

    /// Undo-stack timestamps, newest first.
    pub fn undo_stamps(&self) -> Result<Vec<u64>, Box<dyn Error>> {
        Ok(self
            .coordinator
            .undo_entries()?
            .iter()
            .map(DescriptorProxy::timestamp)
            .collect())
    }

    pub fn redo_stamps(&self) -> Result<Vec<u64>, Box<dyn Error>> {
        Ok(self
            .coordinator
            .redo_entries()?
            .iter()
            .map(DescriptorProxy::timestamp)
            .collect())
    }
}

/// A rename refactoring in `project` (`None` for workspace level).
pub fn rename(project: Option<&str>, element: &str) -> RefactoringDescriptor {
    let mut arguments = BTreeMap::new();
    arguments.insert("element".to_string(), element.to_string());
    arguments.insert("name".to_string(), format!("{element}Renamed"));
    RefactoringDescriptor::new(
        "refhist.rename",
        project,
        format!("Rename '{element}'"),
        arguments,
        DescriptorFlags::NONE,
    )
}

pub fn flagged(project: Option<&str>, element: &str, flags: DescriptorFlags) -> RefactoringDescriptor {
    RefactoringDescriptor::new(
        "refhist.change.signature",
        project,
        format!("Change signature of '{element}'"),
        BTreeMap::new(),
        flags,
    )
}
