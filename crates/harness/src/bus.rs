use refhist_engine::{LifecycleSink, NotificationSource, OperationEvent, ResourceEvent, SubscriptionId};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Subscribers {
    next: u64,
    sinks: Vec<(SubscriptionId, Arc<dyn LifecycleSink>)>,
}

/// Stand-in for the operation history and the workspace change stream.
#[derive(Default)]
pub struct OperationBus {
    subscribers: Mutex<Subscribers>,
}

impl OperationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn LifecycleSink>> {
        self.lock().sinks.iter().map(|(_, sink)| sink.clone()).collect()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().sinks.len()
    }

    pub fn emit_operation(&self, event: OperationEvent) {
        for sink in self.snapshot() {
            sink.operation_notification(event.clone());
        }
    }

    pub fn emit_resource(&self, event: ResourceEvent) {
        for sink in self.snapshot() {
            sink.resource_notification(event.clone());
        }
    }
}

impl NotificationSource for OperationBus {
    fn subscribe(&self, sink: Arc<dyn LifecycleSink>) -> SubscriptionId {
        let mut subscribers = self.lock();
        subscribers.next += 1;
        let id = SubscriptionId(subscribers.next);
        subscribers.sinks.push((id, sink));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().sinks.retain(|(sink_id, _)| *sink_id != id);
    }
}
