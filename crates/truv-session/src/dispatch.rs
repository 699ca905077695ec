// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Listener registry and event fan-out.
//
// Delivery is synchronous, in registration order, fire-and-forget.  Each
// dispatch iterates over a snapshot taken under the lock, so listeners may
// add or remove listeners (themselves included) from inside a callback.
// Listeners added during a dispatch do not see that event; listeners removed
// during a dispatch still do.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;
use truv_core::types::ListenerId;
use truv_core::{EventPayload, SuccessPayload};

/// Host-side observer of the hosted flow.
pub trait TruvEventsListener: Send + Sync {
    /// The user linked an account.
    fn on_success(&self, payload: &SuccessPayload);

    /// Any decoded event.
    fn on_event(&self, event: &EventPayload);

    /// The flow closed, or the page failed to load.
    fn on_close(&self);

    /// The hosted page finished loading.
    fn on_load(&self);

    /// The page reported an error, or a success payload failed to decode.
    fn on_error(&self);
}

type Entry = (ListenerId, Arc<dyn TruvEventsListener>);

/// Ordered listener set with stable removal handles.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener and return its handle.
    pub fn add(&self, listener: Arc<dyn TruvEventsListener>) -> ListenerId {
        let id = ListenerId::new();
        self.entries().push((id, listener));
        id
    }

    /// Remove a listener.  Returns false when the handle is unknown.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn snapshot(&self) -> Vec<Arc<dyn TruvEventsListener>> {
        self.entries()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Call `deliver` once per listener registered at call time.
    pub fn dispatch(&self, deliver: impl Fn(&dyn TruvEventsListener)) {
        let snapshot = self.snapshot();
        trace!(listeners = snapshot.len(), "dispatching");
        for listener in snapshot {
            deliver(listener.as_ref());
        }
    }

    pub fn notify_success(&self, payload: &SuccessPayload) {
        self.dispatch(|l| l.on_success(payload));
    }

    pub fn notify_event(&self, event: &EventPayload) {
        self.dispatch(|l| l.on_event(event));
    }

    pub fn notify_close(&self) {
        self.dispatch(|l| l.on_close());
    }

    pub fn notify_load(&self) {
        self.dispatch(|l| l.on_load());
    }

    pub fn notify_error(&self) {
        self.dispatch(|l| l.on_error());
    }
}
