//! Listener fan-out for execution and history notifications, plus the
//! inbound notification types the coordinator consumes.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use refhist_core::{DescriptorProxy, RefactoringDescriptor};

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionEventKind {
    AboutToPerform,
    Performed,
    AboutToUndo,
    Undone,
    AboutToRedo,
    Redone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEvent {
    pub kind: ExecutionEventKind,
    pub proxy: DescriptorProxy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryEventKind {
    Pushed,
    Popped,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEvent {
    pub kind: HistoryEventKind,
    pub proxy: DescriptorProxy,
}

pub trait ExecutionListener: Send + Sync {
    fn execution_notification(&self, event: &ExecutionEvent) -> Result<(), ListenerError>;
}

pub trait HistoryListener: Send + Sync {
    fn history_notification(&self, event: &HistoryEvent) -> Result<(), ListenerError>;
}

impl<F> ExecutionListener for F
where
    F: Fn(&ExecutionEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn execution_notification(&self, event: &ExecutionEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

impl<F> HistoryListener for F
where
    F: Fn(&HistoryEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn history_notification(&self, event: &HistoryEvent) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Operation-history transitions reported by the external operation framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationEvent {
    /// `None` when the operation carries no descriptor.
    AboutToExecute(Option<RefactoringDescriptor>),
    Done,
    AboutToUndo,
    Undone,
    AboutToRedo,
    Redone,
}

/// Resource lifecycle transitions reported by the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    ProjectAboutToBeDeleted(String),
    ProjectAboutToBeClosed(String),
}

/// Receiver side of the external notification streams.
pub trait LifecycleSink: Send + Sync {
    fn operation_notification(&self, event: OperationEvent);

    fn resource_notification(&self, event: ResourceEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The external operation history and workspace, as a subscription point.
pub trait NotificationSource: Send + Sync {
    fn subscribe(&self, sink: Arc<dyn LifecycleSink>) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// An event waiting to be dispatched once the coordinator state lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Notification {
    Execution(ExecutionEvent),
    History(HistoryEvent),
}

impl Notification {
    pub(crate) fn execution(kind: ExecutionEventKind, proxy: DescriptorProxy) -> Self {
        Self::Execution(ExecutionEvent { kind, proxy })
    }

    pub(crate) fn history(kind: HistoryEventKind, proxy: DescriptorProxy) -> Self {
        Self::History(HistoryEvent { kind, proxy })
    }
}

/// Listener identity is the address of the shared allocation.
fn same_listener<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

struct Registry<L: ?Sized> {
    listeners: Mutex<Vec<Arc<L>>>,
}

impl<L: ?Sized> Registry<L> {
    fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<L>>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn add(&self, listener: Arc<L>) -> bool {
        let mut listeners = self.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    fn remove(&self, listener: &Arc<L>) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot so listeners may (un)register while being notified.
    fn snapshot(&self) -> Vec<Arc<L>> {
        self.lock().clone()
    }
}

/// Calls every listener in registration order. Failures are logged and
/// never stop the loop. Returns the number of failed listeners.
fn dispatch<L: ?Sized>(
    registry: &'static str,
    listeners: Vec<Arc<L>>,
    notify: impl Fn(&L) -> Result<(), ListenerError>,
) -> usize {
    let mut failures = 0;
    for listener in listeners {
        match catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                failures += 1;
                warn!(registry, %error, "listener failed");
            }
            Err(_) => {
                failures += 1;
                warn!(registry, "listener panicked");
            }
        }
    }
    failures
}

pub struct EventHub {
    execution: Registry<dyn ExecutionListener>,
    history: Registry<dyn HistoryListener>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            execution: Registry::new(),
            history: Registry::new(),
        }
    }

    /// Returns `false` if the listener was already registered.
    pub fn add_execution_listener(&self, listener: Arc<dyn ExecutionListener>) -> bool {
        self.execution.add(listener)
    }

    pub fn remove_execution_listener(&self, listener: &Arc<dyn ExecutionListener>) -> bool {
        self.execution.remove(listener)
    }

    /// Returns `false` if the listener was already registered.
    pub fn add_history_listener(&self, listener: Arc<dyn HistoryListener>) -> bool {
        self.history.add(listener)
    }

    pub fn remove_history_listener(&self, listener: &Arc<dyn HistoryListener>) -> bool {
        self.history.remove(listener)
    }

    pub fn execution_listener_count(&self) -> usize {
        self.execution.len()
    }

    pub fn history_listener_count(&self) -> usize {
        self.history.len()
    }

    pub fn fire_execution(&self, event: &ExecutionEvent) -> usize {
        dispatch("execution", self.execution.snapshot(), |l| {
            l.execution_notification(event)
        })
    }

    pub fn fire_history(&self, event: &HistoryEvent) -> usize {
        dispatch("history", self.history.snapshot(), |l| l.history_notification(event))
    }

    pub(crate) fn fire_all(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Execution(event) => {
                    self.fire_execution(&event);
                }
                Notification::History(event) => {
                    self.fire_history(&event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn proxy(timestamp: u64) -> DescriptorProxy {
        DescriptorProxy::new(Some("P"), "r", timestamp)
    }

    struct Recorder {
        seen: Mutex<Vec<ExecutionEventKind>>,
    }

    impl ExecutionListener for Recorder {
        fn execution_notification(&self, event: &ExecutionEvent) -> Result<(), ListenerError> {
            self.seen.lock().unwrap().push(event.kind);
            Ok(())
        }
    }

    #[test]
    fn duplicate_registration_is_noop() {
        let hub = EventHub::new();
        let recorder: Arc<dyn ExecutionListener> = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        assert!(hub.add_execution_listener(recorder.clone()));
        assert!(!hub.add_execution_listener(recorder.clone()));
        assert_eq!(hub.execution_listener_count(), 1);

        assert!(hub.remove_execution_listener(&recorder));
        assert!(!hub.remove_execution_listener(&recorder));
        assert_eq!(hub.execution_listener_count(), 0);
    }

    #[test]
    fn failing_listeners_do_not_stop_dispatch() {
        let hub = EventHub::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing: Arc<dyn HistoryListener> =
            Arc::new(|_: &HistoryEvent| -> Result<(), ListenerError> { Err("boom".into()) });
        let panicking: Arc<dyn HistoryListener> =
            Arc::new(|_: &HistoryEvent| -> Result<(), ListenerError> { panic!("listener bug") });
        let counter = calls.clone();
        let counting: Arc<dyn HistoryListener> = Arc::new(move |_: &HistoryEvent| -> Result<(), ListenerError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        hub.add_history_listener(failing);
        hub.add_history_listener(panicking);
        hub.add_history_listener(counting);

        let failures = hub.fire_history(&HistoryEvent {
            kind: HistoryEventKind::Pushed,
            proxy: proxy(1),
        });
        assert_eq!(failures, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_in_registration_order() {
        let hub = EventHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3 {
            let order = order.clone();
            let listener: Arc<dyn ExecutionListener> =
                Arc::new(move |_: &ExecutionEvent| -> Result<(), ListenerError> {
                    order.lock().unwrap().push(id);
                    Ok(())
                });
            hub.add_execution_listener(listener);
        }
        hub.fire_all(vec![Notification::execution(ExecutionEventKind::Performed, proxy(2))]);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn listener_may_unregister_during_dispatch() {
        let hub = Arc::new(EventHub::new());
        let slot: Arc<Mutex<Option<Arc<dyn ExecutionListener>>>> = Arc::new(Mutex::new(None));
        let weak_hub = Arc::downgrade(&hub);
        let slot_inner = slot.clone();
        let listener: Arc<dyn ExecutionListener> =
            Arc::new(move |_: &ExecutionEvent| -> Result<(), ListenerError> {
                if let (Some(hub), Some(me)) = (weak_hub.upgrade(), slot_inner.lock().unwrap().clone()) {
                    hub.remove_execution_listener(&me);
                }
                Ok(())
            });
        *slot.lock().unwrap() = Some(listener.clone());
        hub.add_execution_listener(listener);

        let event = ExecutionEvent {
            kind: ExecutionEventKind::AboutToPerform,
            proxy: proxy(3),
        };
        assert_eq!(hub.fire_execution(&event), 0);
        assert_eq!(hub.execution_listener_count(), 0);
    }

    #[test]
    fn recorder_sees_kinds() {
        let hub = EventHub::new();
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        hub.add_execution_listener(recorder.clone());
        hub.fire_all(vec![
            Notification::execution(ExecutionEventKind::AboutToUndo, proxy(1)),
            Notification::history(HistoryEventKind::Popped, proxy(1)),
            Notification::execution(ExecutionEventKind::Undone, proxy(0)),
        ]);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![ExecutionEventKind::AboutToUndo, ExecutionEventKind::Undone]
        );
    }
}
