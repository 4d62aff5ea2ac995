//! Change event fan-out.
//!
//! The notifier is an explicitly constructed component that write-path
//! tools share; cloning shares the subscriber list. Events are dispatched
//! synchronously with no buffering, so a subscriber sees an event or it
//! doesn't. Callbacks run outside the internal lock, which makes
//! subscribing or emitting from inside a callback safe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// A single change notification.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Virtual path of the affected node.
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

struct NotifierInner {
    next_id: u64,
    subscribers: HashMap<u64, Callback>,
}

/// Shared change notifier.
#[derive(Clone)]
pub struct ChangeNotifier {
    inner: Arc<Mutex<NotifierInner>>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierInner {
                next_id: 0,
                subscribers: HashMap::new(),
            })),
        }
    }

    /// Register a callback. The subscription ends when the returned handle
    /// is dropped or `unsubscribe` is called.
    pub fn subscribe(&self, callback: impl Fn(&ChangeEvent) + Send + Sync + 'static) -> Subscription {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("notifier poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, Arc::new(callback));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Dispatch an event to all current subscribers.
    pub fn emit(&self, kind: ChangeKind, path: impl Into<String>) {
        let event = ChangeEvent {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        };

        // Snapshot the callbacks so they run without the lock held.
        let callbacks: Vec<Callback> = {
            #[allow(clippy::expect_used)]
            let inner = self.inner.lock().expect("notifier poisoned");
            inner.subscribers.values().cloned().collect()
        };

        for callback in callbacks {
            callback(&event);
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("notifier poisoned");
        inner.subscribers.len()
    }
}

/// Handle for an active subscription. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<NotifierInner>>,
}

impl Subscription {
    /// End the subscription explicitly.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn remove(&self) {
        if let Some(inner) = self.inner.upgrade() {
            #[allow(clippy::expect_used)]
            let mut inner = inner.lock().expect("notifier poisoned");
            inner.subscribers.remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
