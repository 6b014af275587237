use std::collections::VecDeque;

use thiserror::Error;
use tracing::debug;

use refhist_core::{DescriptorProxy, RefactoringDescriptor};
use refhist_storage::StorageError;

use crate::cache::ManagerCache;
use crate::scope::ScopeLocation;

pub const MAX_UNDO_STACK: usize = 5;

/// Drops every entry `proxy` identifies. Returns whether any was dropped.
fn remove_matching(entries: &mut VecDeque<RefactoringDescriptor>, proxy: &DescriptorProxy) -> bool {
    let before = entries.len();
    entries.retain(|d| d.proxy() != *proxy);
    entries.len() != before
}

/// Pop or peek on an empty collection. The operation framework never asks
/// for undo/redo with nothing to undo/redo, so this is a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{collection} is empty")]
pub struct EmptyStackError {
    pub collection: &'static str,
}

/// The most recently performed descriptors, newest at the head.
pub struct UndoStack {
    entries: VecDeque<RefactoringDescriptor>,
    max_depth: usize,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Pushes onto the head. The oldest entry is dropped silently when the
    /// stack overflows. Returns the proxy to announce for this push.
    pub fn push(&mut self, descriptor: RefactoringDescriptor) -> DescriptorProxy {
        let proxy = descriptor.proxy();
        self.entries.push_front(descriptor);
        // Enforce depth limit by dropping oldest entry
        if self.entries.len() > self.max_depth
            && let Some(dropped) = self.entries.pop_back()
        {
            debug!(timestamp = dropped.timestamp(), "undo stack overflow dropped oldest entry");
        }
        proxy
    }

    pub fn pop(&mut self) -> Result<RefactoringDescriptor, EmptyStackError> {
        self.entries.pop_front().ok_or(EmptyStackError {
            collection: "undo stack",
        })
    }

    pub fn peek(&self) -> Result<&RefactoringDescriptor, EmptyStackError> {
        self.entries.front().ok_or(EmptyStackError {
            collection: "undo stack",
        })
    }

    pub fn find(&self, timestamp: u64) -> Option<&RefactoringDescriptor> {
        self.entries.iter().find(|d| d.timestamp() == timestamp)
    }

    /// Looks the proxy up in memory first, then in the persisted log at the
    /// location `scope` yields. `Ok(None)` means not found anywhere.
    pub fn resolve(
        &self,
        proxy: &DescriptorProxy,
        cache: &mut ManagerCache,
        scope: impl FnOnce() -> Option<ScopeLocation>,
    ) -> Result<Option<RefactoringDescriptor>, StorageError> {
        if let Some(descriptor) = self.find(proxy.timestamp()) {
            return Ok(Some(descriptor.clone()));
        }
        let Some(location) = scope() else {
            return Ok(None);
        };
        cache
            .get(&location.path, location.project.as_deref())?
            .request_descriptor(proxy.timestamp())
    }

    pub fn remove(&mut self, proxy: &DescriptorProxy) -> bool {
        remove_matching(&mut self.entries, proxy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefactoringDescriptor> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_depth
    }
}

/// Descriptors undone but not yet redone, most recently undone at the front.
#[derive(Default)]
pub struct RedoQueue {
    entries: VecDeque<RefactoringDescriptor>,
}

impl RedoQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_front(&mut self, descriptor: RefactoringDescriptor) {
        self.entries.push_front(descriptor);
    }

    pub fn pop_front(&mut self) -> Result<RefactoringDescriptor, EmptyStackError> {
        self.entries.pop_front().ok_or(EmptyStackError {
            collection: "redo queue",
        })
    }

    pub fn front(&self) -> Result<&RefactoringDescriptor, EmptyStackError> {
        self.entries.front().ok_or(EmptyStackError {
            collection: "redo queue",
        })
    }

    pub fn remove(&mut self, proxy: &DescriptorProxy) -> bool {
        remove_matching(&mut self.entries, proxy)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefactoringDescriptor> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
