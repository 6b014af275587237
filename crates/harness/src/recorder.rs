use refhist_engine::{
    ExecutionEvent, ExecutionEventKind, ExecutionListener, HistoryEvent, HistoryEventKind,
    HistoryListener, ListenerError,
};
use std::sync::Mutex;

/// Listener that keeps every notification it receives.
#[derive(Default)]
pub struct EventRecorder {
    execution: Mutex<Vec<ExecutionEvent>>,
    history: Mutex<Vec<HistoryEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn execution_events(&self) -> Vec<ExecutionEvent> {
        match self.execution.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn history_events(&self) -> Vec<HistoryEvent> {
        match self.history.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn execution_kinds(&self) -> Vec<ExecutionEventKind> {
        self.execution_events().into_iter().map(|e| e.kind).collect()
    }

    pub fn history_kinds(&self) -> Vec<HistoryEventKind> {
        self.history_events().into_iter().map(|e| e.kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.execution.lock() {
            events.clear();
        }
        if let Ok(mut events) = self.history.lock() {
            events.clear();
        }
    }
}

impl ExecutionListener for EventRecorder {
    fn execution_notification(&self, event: &ExecutionEvent) -> Result<(), ListenerError> {
        self.execution
            .lock()
            .map_err(|_| "execution log poisoned")?
            .push(event.clone());
        Ok(())
    }
}

impl HistoryListener for EventRecorder {
    fn history_notification(&self, event: &HistoryEvent) -> Result<(), ListenerError> {
        self.history
            .lock()
            .map_err(|_| "history log poisoned")?
            .push(event.clone());
        Ok(())
    }
}
