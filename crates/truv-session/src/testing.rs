// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared test fixtures.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use truv_core::{EventPayload, EventType, SuccessPayload};

use crate::dispatch::TruvEventsListener;
use crate::external_login::{ExternalLoginObserver, ExternalLoginOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Success(String),
    Event(EventType),
    Close,
    Load,
    Error,
}

/// Listener that writes down every callback.
#[derive(Default)]
pub struct RecordingListener {
    calls: Mutex<Vec<Recorded>>,
    tag: Option<(&'static str, Arc<Mutex<Vec<&'static str>>>)>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also pushes `tag` onto `order` on every callback.
    pub fn tagged(tag: &'static str, order: Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            tag: Some((tag, order)),
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Recorded) {
        self.calls.lock().unwrap().push(call);
        if let Some((tag, order)) = &self.tag {
            order.lock().unwrap().push(tag);
        }
    }
}

impl TruvEventsListener for RecordingListener {
    fn on_success(&self, payload: &SuccessPayload) {
        self.record(Recorded::Success(payload.public_token.clone()));
    }

    fn on_event(&self, event: &EventPayload) {
        self.record(Recorded::Event(event.event_type));
    }

    fn on_close(&self) {
        self.record(Recorded::Close);
    }

    fn on_load(&self) {
        self.record(Recorded::Load);
    }

    fn on_error(&self) {
        self.record(Recorded::Error);
    }
}

/// Observer that keeps every external-login outcome.
#[derive(Default)]
pub struct RecordingObserver {
    outcomes: Mutex<Vec<ExternalLoginOutcome>>,
}

impl RecordingObserver {
    pub fn outcomes(&self) -> Vec<ExternalLoginOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

impl ExternalLoginObserver for RecordingObserver {
    fn on_outcome(&self, outcome: ExternalLoginOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
