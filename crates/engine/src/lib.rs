pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod query;
pub mod scope;
pub mod undo;

pub use cache::ManagerCache;
pub use config::CoordinatorConfig;
pub use error::EngineError;
pub use events::{
    EventHub, ExecutionEvent, ExecutionEventKind, ExecutionListener, HistoryEvent, HistoryEventKind,
    HistoryListener, LifecycleSink, ListenerError, NotificationSource, OperationEvent, ResourceEvent,
    SubscriptionId,
};
pub use query::{HistoryQuery, HistoryReport, ScopeFailure};
pub use scope::{HistoryLocations, Scope, ScopeLocation, ScopePolicy, Workspace};
pub use undo::{EmptyStackError, RedoQueue, UndoStack};

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::{debug, error, warn};

use refhist_core::{
    DescriptorFlags, DescriptorProxy, Outcome, ProgressMonitor, RefactoringDescriptor,
    RefactoringHistory, StampClock,
};
use refhist_storage::{
    NAME_WORKSPACE_PROJECT, RefactoringSession, StorageError, StoreProvider, read_session,
    write_session,
};

use crate::events::Notification;

/// External capabilities the coordinator is built on.
pub struct Collaborators {
    pub provider: Arc<dyn StoreProvider>,
    pub workspace: Arc<dyn Workspace>,
    pub policy: Arc<dyn ScopePolicy>,
    /// Operation-history and resource notifications to subscribe to while
    /// connected. Without one, callers drive the `handle_*` methods directly.
    pub notifications: Option<Arc<dyn NotificationSource>>,
}

/// In-memory state that only exists while connected.
struct Session {
    undo: UndoStack,
    redo: RedoQueue,
    cache: ManagerCache,
    /// Descriptor announced by the last about-to-execute, consumed by done.
    pending: Option<RefactoringDescriptor>,
}

impl Session {
    fn new(config: &CoordinatorConfig, provider: Arc<dyn StoreProvider>) -> Self {
        Self {
            undo: UndoStack::new(config.undo_capacity),
            redo: RedoQueue::new(),
            cache: ManagerCache::new(provider, config.cache_capacity),
            pending: None,
        }
    }
}

struct Lifecycle {
    references: usize,
    session: Option<Session>,
    subscription: Option<SubscriptionId>,
    /// Outlives sessions so a reconnect never reissues a stamp.
    clock: StampClock,
}

impl Lifecycle {
    fn session(&mut self) -> Result<&mut Session, EngineError> {
        self.session.as_mut().ok_or(EngineError::NotConnected)
    }
}

struct Inner {
    config: CoordinatorConfig,
    locations: HistoryLocations,
    provider: Arc<dyn StoreProvider>,
    workspace: Arc<dyn Workspace>,
    policy: Arc<dyn ScopePolicy>,
    notifications: Option<Arc<dyn NotificationSource>>,
    hub: EventHub,
    unknown: RefactoringDescriptor,
    /// Undo stack, redo queue and manager cache change together under this lock.
    state: Mutex<Lifecycle>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn locate(&self, scope: &Scope) -> Option<ScopeLocation> {
        self.locations
            .resolve(scope, self.workspace.as_ref(), self.policy.as_ref())
    }

    /// Adds (`present`) or removes a performed descriptor in its scope's log.
    /// Failures are logged and never touch stack/queue state.
    fn record(&self, session: &mut Session, descriptor: &RefactoringDescriptor, present: bool) {
        if !self.config.persist_performed || descriptor.is_unknown() {
            return;
        }
        let scope = Scope::of(descriptor.project());
        let Some(location) = self.locate(&scope) else {
            debug!(%scope, "no history location; descriptor not persisted");
            return;
        };
        let result = session
            .cache
            .get(&location.path, location.project.as_deref())
            .and_then(|store| {
                if present {
                    store.add_descriptor(descriptor)
                } else {
                    store.remove_descriptors(&[descriptor.timestamp()]).map(|_| ())
                }
            });
        if let Err(error) = result {
            warn!(%scope, timestamp = descriptor.timestamp(), %error, "failed to persist refactoring history");
        }
    }

    /// Moves `clock` past the newest stamp already in the log `descriptor`
    /// will be recorded to, so a log written by an earlier session or another
    /// coordinator never has a row overwritten.
    fn observe_persisted(&self, session: &mut Session, clock: &mut StampClock, descriptor: &RefactoringDescriptor) {
        if !self.config.persist_performed || descriptor.is_unknown() {
            return;
        }
        let scope = Scope::of(descriptor.project());
        let Some(location) = self.locate(&scope) else {
            return;
        };
        match session
            .cache
            .get(&location.path, location.project.as_deref())
            .and_then(|store| store.latest_timestamp())
        {
            Ok(Some(latest)) => clock.observe(latest),
            Ok(None) => {}
            Err(error) => warn!(%scope, %error, "failed to read latest refactoring stamp"),
        }
    }

    fn read_scope(
        &self,
        session: &mut Session,
        scope: &Scope,
        query: &HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<RefactoringHistory>, StorageError> {
        if monitor.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let Some(location) = self.locate(scope) else {
            return Ok(Outcome::Completed(RefactoringHistory::EMPTY));
        };
        let history = session
            .cache
            .get(&location.path, location.project.as_deref())?
            .read_history(query.range, query.flags)?;
        monitor.worked(1);
        Ok(Outcome::Completed(history))
    }

    /// Union of several scopes, deduplicated by proxy identity. A failed
    /// scope is skipped and reported unless the query is fail-fast.
    fn read_scopes(
        &self,
        session: &mut Session,
        scopes: &[Scope],
        query: &HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<HistoryReport>, EngineError> {
        let mut report = HistoryReport::default();
        for scope in scopes {
            if monitor.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
            match self.read_scope(session, scope, query, monitor) {
                Ok(Outcome::Completed(history)) => report.history.extend(history),
                Ok(Outcome::Cancelled) => return Ok(Outcome::Cancelled),
                Err(source) if query.fail_fast => {
                    return Err(EngineError::ScopeFailed {
                        scope: scope.clone(),
                        source,
                    });
                }
                Err(error) => {
                    warn!(%scope, %error, "skipping unreadable refactoring history");
                    report.failures.push(ScopeFailure {
                        scope: scope.clone(),
                        error,
                    });
                }
            }
        }
        Ok(Outcome::Completed(report))
    }
}

/// Records performed refactorings as undoable/redoable entries and routes
/// history queries to the right per-scope log.
///
/// Clones share one coordinator. In-memory state exists only between the
/// first [`connect`](Self::connect) and the matching last
/// [`disconnect`](Self::disconnect).
#[derive(Clone)]
pub struct HistoryCoordinator {
    inner: Arc<Inner>,
}

/// Keeps the coordinator connected until dropped.
pub struct ConnectionGuard {
    coordinator: HistoryCoordinator,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Err(error) = self.coordinator.disconnect() {
            warn!(%error, "refactoring history disconnect failed");
        }
    }
}

impl HistoryCoordinator {
    pub fn new(config: CoordinatorConfig, collaborators: Collaborators) -> Self {
        let locations = HistoryLocations::new(&config.state_location);
        Self {
            inner: Arc::new(Inner {
                config,
                locations,
                provider: collaborators.provider,
                workspace: collaborators.workspace,
                policy: collaborators.policy,
                notifications: collaborators.notifications,
                hub: EventHub::new(),
                unknown: RefactoringDescriptor::unknown(),
                state: Mutex::new(Lifecycle {
                    references: 0,
                    session: None,
                    subscription: None,
                    clock: StampClock::new(),
                }),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn locations(&self) -> &HistoryLocations {
        &self.inner.locations
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Increments the reference count; the first reference allocates the
    /// undo stack, redo queue and manager cache and subscribes to notifications.
    pub fn connect(&self) {
        let mut state = self.inner.lock();
        state.references += 1;
        if state.references == 1 {
            state.session = Some(Session::new(&self.inner.config, self.inner.provider.clone()));
            if let Some(source) = &self.inner.notifications {
                let sink: Arc<dyn LifecycleSink> = Arc::new(CoordinatorSink {
                    inner: Arc::downgrade(&self.inner),
                });
                state.subscription = Some(source.subscribe(sink));
            }
            debug!("refactoring history connected");
        }
    }

    /// Connects for the lifetime of the returned guard.
    pub fn connection(&self) -> ConnectionGuard {
        self.connect();
        ConnectionGuard {
            coordinator: self.clone(),
        }
    }

    /// Decrements the reference count; the last reference unsubscribes and
    /// drops all in-memory history. Persisted logs are untouched.
    pub fn disconnect(&self) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        if state.references == 0 {
            return Err(EngineError::NotConnected);
        }
        if let Some(session) = state.session.as_mut() {
            session.cache.clear();
        }
        state.references -= 1;
        if state.references == 0 {
            if let (Some(source), Some(id)) = (&self.inner.notifications, state.subscription.take()) {
                source.unsubscribe(id);
            }
            state.session = None;
            debug!("refactoring history disconnected");
        }
        Ok(())
    }

    pub fn reference_count(&self) -> usize {
        self.inner.lock().references
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    // ========================================================================
    // Operation and resource notifications
    // ========================================================================

    pub fn handle_operation_event(&self, event: OperationEvent) -> Result<(), EngineError> {
        let inner = &self.inner;
        let mut notifications = Vec::new();
        {
            let mut state = inner.lock();
            let Lifecycle { session, clock, .. } = &mut *state;
            let session = session.as_mut().ok_or(EngineError::NotConnected)?;
            match event {
                OperationEvent::AboutToExecute(descriptor) => {
                    let proxy = descriptor
                        .as_ref()
                        .map_or_else(|| inner.unknown.proxy(), RefactoringDescriptor::proxy);
                    session.pending = descriptor;
                    notifications.push(Notification::execution(ExecutionEventKind::AboutToPerform, proxy));
                }
                OperationEvent::Done => {
                    let descriptor = match session.pending.take() {
                        Some(descriptor) => {
                            inner.observe_persisted(session, clock, &descriptor);
                            descriptor.stamped(clock.tick()?)
                        }
                        None => inner.unknown.clone(),
                    };
                    inner.record(session, &descriptor, true);
                    let pushed = session.undo.push(descriptor);
                    // performing invalidates every pending redo
                    session.redo.clear();
                    notifications.push(Notification::history(HistoryEventKind::Pushed, pushed.clone()));
                    notifications.push(Notification::execution(ExecutionEventKind::Performed, pushed));
                }
                OperationEvent::AboutToUndo => {
                    let top = session.undo.peek()?.proxy();
                    notifications.push(Notification::execution(ExecutionEventKind::AboutToUndo, top));
                }
                OperationEvent::Undone => {
                    let undone = session.undo.pop()?;
                    inner.record(session, &undone, false);
                    notifications.push(Notification::history(HistoryEventKind::Popped, undone.proxy()));
                    session.redo.push_front(undone);
                    let top = session
                        .undo
                        .peek()
                        .map_or_else(|_| inner.unknown.proxy(), RefactoringDescriptor::proxy);
                    notifications.push(Notification::execution(ExecutionEventKind::Undone, top));
                }
                OperationEvent::AboutToRedo => {
                    let front = session.redo.front()?.proxy();
                    notifications.push(Notification::execution(ExecutionEventKind::AboutToRedo, front));
                }
                OperationEvent::Redone => {
                    let redone = session.redo.pop_front()?;
                    inner.record(session, &redone, true);
                    let pushed = session.undo.push(redone);
                    notifications.push(Notification::history(HistoryEventKind::Pushed, pushed.clone()));
                    notifications.push(Notification::execution(ExecutionEventKind::Redone, pushed));
                }
            }
        }
        inner.hub.fire_all(notifications);
        Ok(())
    }

    /// Project close or delete empties the undo stack and redo queue, whether
    /// or not their entries reference the project. Delete also removes the
    /// project's shared log.
    pub fn handle_resource_event(&self, event: ResourceEvent) -> Result<(), EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        session.undo.clear();
        session.redo.clear();
        match event {
            ResourceEvent::ProjectAboutToBeClosed(project) => {
                debug!(%project, "project closing; undo/redo cleared");
            }
            ResourceEvent::ProjectAboutToBeDeleted(project) => {
                let shared = inner.locations.shared(&project);
                session.cache.evict(&shared);
                if let Some(location) = inner.workspace.location(&project) {
                    session.cache.evict(&HistoryLocations::local(&location));
                }
                inner.provider.delete(&shared)?;
                debug!(%project, "project deleting; undo/redo cleared, shared history removed");
            }
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get_project_history(
        &self,
        project: &str,
        query: HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<RefactoringHistory>, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        if !inner.workspace.exists(project) {
            return Err(EngineError::ProjectUnavailable(project.to_string()));
        }
        monitor.begin_task("Retrieving refactoring history", 1);
        let result = inner.read_scope(session, &Scope::Project(project.to_string()), &query, monitor);
        monitor.done();
        Ok(result?)
    }

    /// History of the given projects merged; an empty list means the whole workspace.
    pub fn get_refactoring_history(
        &self,
        projects: &[&str],
        query: HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<HistoryReport>, EngineError> {
        if projects.is_empty() {
            return self.get_workspace_history(query, monitor);
        }
        let scopes: Vec<Scope> = projects
            .iter()
            .map(|project| Scope::Project(project.to_string()))
            .collect();
        self.read_merged(&scopes, query, monitor)
    }

    /// Every accessible project plus the workspace-level log.
    pub fn get_workspace_history(
        &self,
        query: HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<HistoryReport>, EngineError> {
        let mut scopes: Vec<Scope> = self
            .inner
            .workspace
            .projects()
            .into_iter()
            .map(Scope::Project)
            .collect();
        scopes.push(Scope::Workspace);
        self.read_merged(&scopes, query, monitor)
    }

    fn read_merged(
        &self,
        scopes: &[Scope],
        query: HistoryQuery,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<HistoryReport>, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        monitor.begin_task("Retrieving refactoring history", scopes.len());
        let result = inner.read_scopes(session, scopes, &query, monitor);
        monitor.done();
        result
    }

    /// Resolves a proxy from the undo stack, falling back to its scope's log.
    pub fn resolve_descriptor(
        &self,
        proxy: &DescriptorProxy,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<Option<RefactoringDescriptor>>, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let Session { undo, cache, .. } = state.session()?;
        if monitor.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let scope = Scope::of(proxy.project());
        let found = undo.resolve(proxy, cache, || inner.locate(&scope))?;
        Ok(Outcome::Completed(found))
    }

    pub fn has_project_history(&self, project: &str) -> bool {
        self.inner.policy.is_local(project)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Deletes each proxy `confirm` accepts from its scope's log and from the
    /// undo stack and redo queue, announcing it as deleted. A proxy with
    /// neither a resolvable log nor an in-memory entry is skipped silently.
    /// `confirm` runs without the state lock held.
    pub fn delete_descriptors(
        &self,
        proxies: &[DescriptorProxy],
        mut confirm: impl FnMut(&DescriptorProxy) -> bool,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<usize>, EngineError> {
        self.inner.lock().session()?;
        monitor.begin_task("Deleting refactorings", proxies.len());
        let mut deleted = 0;
        for proxy in proxies {
            if monitor.is_cancelled() {
                monitor.done();
                return Ok(Outcome::Cancelled);
            }
            if confirm(proxy) && self.remove_everywhere(proxy)? {
                deleted += 1;
                self.inner.hub.fire_history(&HistoryEvent {
                    kind: HistoryEventKind::Deleted,
                    proxy: proxy.clone(),
                });
            }
            monitor.worked(1);
        }
        monitor.done();
        Ok(Outcome::Completed(deleted))
    }

    /// Returns whether `proxy` had anywhere to be deleted from.
    fn remove_everywhere(&self, proxy: &DescriptorProxy) -> Result<bool, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        // a later undo or redo would otherwise write the row back
        let in_memory = session.undo.remove(proxy) | session.redo.remove(proxy);
        let scope = Scope::of(proxy.project());
        let Some(location) = inner.locate(&scope) else {
            debug!(%scope, timestamp = proxy.timestamp(), in_memory, "no history location for deleted refactoring");
            return Ok(in_memory);
        };
        session
            .cache
            .get(&location.path, location.project.as_deref())?
            .remove_descriptors(&[proxy.timestamp()])?;
        Ok(true)
    }

    /// Deletes every persisted log of `project` (`.workspace` names the
    /// workspace-level log).
    pub fn delete_project_history(
        &self,
        project: &str,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<()>, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        if monitor.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let mut targets = Vec::new();
        if project == NAME_WORKSPACE_PROJECT {
            targets.push(inner.locations.workspace());
        } else {
            if !inner.workspace.is_accessible(project) {
                return Err(EngineError::ProjectUnavailable(project.to_string()));
            }
            targets.push(inner.locations.shared(project));
            if let Some(location) = inner.workspace.location(project) {
                targets.push(HistoryLocations::local(&location));
            }
        }
        for target in &targets {
            session.cache.evict(target);
            inner.provider.delete(target)?;
        }
        Ok(Outcome::Completed(()))
    }

    /// Switches `project` between shared and project-local storage, moving an
    /// existing log along. Returns whether a log was moved.
    pub fn set_project_history_mode(
        &self,
        project: &str,
        enabled: bool,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<bool>, EngineError> {
        let inner = &self.inner;
        let mut state = inner.lock();
        let session = state.session()?;
        if !inner.workspace.is_accessible(project) {
            return Err(EngineError::ProjectUnavailable(project.to_string()));
        }
        let project_location = inner
            .workspace
            .location(project)
            .ok_or_else(|| EngineError::ProjectUnavailable(project.to_string()))?;
        if monitor.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let shared = inner.locations.shared(project);
        let local = HistoryLocations::local(&project_location);
        session.cache.evict(&shared);
        session.cache.evict(&local);
        let (from, to) = if enabled { (shared, local) } else { (local, shared) };
        let moved = inner.provider.relocate(&from, &to)?;
        inner.policy.set_local(project, enabled);
        debug!(project, enabled, moved, "project history mode changed");
        Ok(Outcome::Completed(moved))
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Resolves `proxies` and writes those passing `filter` to `writer` as a
    /// session. Unresolvable proxies are skipped. Connects for the duration
    /// of the call. Returns the number written.
    pub fn write_descriptors<W: Write>(
        &self,
        proxies: &[DescriptorProxy],
        writer: &mut W,
        filter: DescriptorFlags,
        monitor: &dyn ProgressMonitor,
    ) -> Result<Outcome<usize>, EngineError> {
        let _connection = self.connection();
        monitor.begin_task("Writing refactorings", proxies.len());
        let mut descriptors = Vec::with_capacity(proxies.len());
        for proxy in proxies {
            match self.resolve_descriptor(proxy, monitor)? {
                Outcome::Cancelled => {
                    monitor.done();
                    return Ok(Outcome::Cancelled);
                }
                Outcome::Completed(Some(descriptor)) if descriptor.flags().passes(filter) => {
                    descriptors.push(descriptor);
                }
                Outcome::Completed(_) => {}
            }
            monitor.worked(1);
        }
        let written = descriptors.len();
        write_session(writer, &RefactoringSession::new(descriptors))?;
        monitor.done();
        Ok(Outcome::Completed(written))
    }

    /// Decodes a session, keeping descriptors that pass `filter`.
    pub fn read_session<R: Read>(
        reader: R,
        filter: DescriptorFlags,
    ) -> Result<Vec<RefactoringDescriptor>, EngineError> {
        let session = read_session(reader)?;
        Ok(session
            .refactorings
            .into_iter()
            .filter(|d| d.flags().passes(filter))
            .collect())
    }

    pub fn read_session_history<R: Read>(
        reader: R,
        filter: DescriptorFlags,
    ) -> Result<RefactoringHistory, EngineError> {
        Ok(Self::read_session(reader, filter)?
            .iter()
            .map(RefactoringDescriptor::proxy)
            .collect())
    }

    // ========================================================================
    // Listeners
    // ========================================================================

    pub fn add_execution_listener(&self, listener: Arc<dyn ExecutionListener>) -> bool {
        self.inner.hub.add_execution_listener(listener)
    }

    pub fn remove_execution_listener(&self, listener: &Arc<dyn ExecutionListener>) -> bool {
        self.inner.hub.remove_execution_listener(listener)
    }

    pub fn add_history_listener(&self, listener: Arc<dyn HistoryListener>) -> bool {
        self.inner.hub.add_history_listener(listener)
    }

    pub fn remove_history_listener(&self, listener: &Arc<dyn HistoryListener>) -> bool {
        self.inner.hub.remove_history_listener(listener)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    pub fn undo_depth(&self) -> Result<usize, EngineError> {
        Ok(self.inner.lock().session()?.undo.len())
    }

    pub fn redo_depth(&self) -> Result<usize, EngineError> {
        Ok(self.inner.lock().session()?.redo.len())
    }

    pub fn peek_undo(&self) -> Result<Option<RefactoringDescriptor>, EngineError> {
        Ok(self.inner.lock().session()?.undo.peek().ok().cloned())
    }

    pub fn peek_redo(&self) -> Result<Option<RefactoringDescriptor>, EngineError> {
        Ok(self.inner.lock().session()?.redo.front().ok().cloned())
    }

    /// Undo stack proxies, newest first.
    pub fn undo_entries(&self) -> Result<Vec<DescriptorProxy>, EngineError> {
        Ok(self.inner.lock().session()?.undo.iter().map(RefactoringDescriptor::proxy).collect())
    }

    /// Redo queue proxies, next redo first.
    pub fn redo_entries(&self) -> Result<Vec<DescriptorProxy>, EngineError> {
        Ok(self.inner.lock().session()?.redo.iter().map(RefactoringDescriptor::proxy).collect())
    }

    /// Locations with a live manager, most recently used first.
    pub fn cached_locations(&self) -> Result<Vec<PathBuf>, EngineError> {
        Ok(self.inner.lock().session()?.cache.locations())
    }
}

/// Subscription handed to the notification source; holds the coordinator weakly.
struct CoordinatorSink {
    inner: Weak<Inner>,
}

impl CoordinatorSink {
    fn coordinator(&self) -> Option<HistoryCoordinator> {
        self.inner.upgrade().map(|inner| HistoryCoordinator { inner })
    }
}

impl LifecycleSink for CoordinatorSink {
    fn operation_notification(&self, event: OperationEvent) {
        if let Some(coordinator) = self.coordinator()
            && let Err(error) = coordinator.handle_operation_event(event)
        {
            error!(%error, "operation notification rejected");
        }
    }

    fn resource_notification(&self, event: ResourceEvent) {
        if let Some(coordinator) = self.coordinator()
            && let Err(error) = coordinator.handle_resource_event(event)
        {
            error!(%error, "resource notification failed");
        }
    }
}
