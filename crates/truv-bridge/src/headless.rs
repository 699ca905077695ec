// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Headless bridge for desktop/CI builds where no browser engine is embedded.
//
// Surfaces record what the engine asked of them and answer script
// evaluations from a queue, the cookie store is a map keyed by host, and HTTP
// answers from canned responses.  Replays and tests drive the engine through
// these.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use truv_core::cookie::host_of;
use truv_core::error::{BridgeError, Result};
use truv_core::types::{HttpRequest, HttpResponse, SurfaceState};

use crate::traits::*;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// -- Surface -----------------------------------------------------------------

#[derive(Debug, Default)]
struct SurfaceRecord {
    loaded: Vec<String>,
    current_url: Option<String>,
    title: Option<String>,
    user_agent: Option<String>,
    states: Vec<SurfaceState>,
    evaluated: Vec<String>,
    queued_results: VecDeque<std::result::Result<String, String>>,
    default_result: Option<String>,
    reloads: usize,
    load_failure: Option<String>,
    dismissed: bool,
}

/// In-memory browsing surface.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    record: Mutex<SurfaceRecord>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result returned once the queue is empty (default `"null"`).
    pub fn set_default_result(&self, result: impl Into<String>) {
        lock(&self.record).default_result = Some(result.into());
    }

    /// Answer the next evaluation with `result`.
    pub fn push_result(&self, result: impl Into<String>) {
        lock(&self.record).queued_results.push_back(Ok(result.into()));
    }

    /// Fail the next evaluation.
    pub fn push_failure(&self, reason: impl Into<String>) {
        lock(&self.record).queued_results.push_back(Err(reason.into()));
    }

    /// Reject every later `load_url` with `reason`.
    pub fn fail_loads(&self, reason: impl Into<String>) {
        lock(&self.record).load_failure = Some(reason.into());
    }

    /// Pretend the engine navigated somewhere on its own.
    pub fn set_current_url(&self, url: impl Into<String>) {
        lock(&self.record).current_url = Some(url.into());
    }

    pub fn loaded_urls(&self) -> Vec<String> {
        lock(&self.record).loaded.clone()
    }

    pub fn evaluated_scripts(&self) -> Vec<String> {
        lock(&self.record).evaluated.clone()
    }

    pub fn states(&self) -> Vec<SurfaceState> {
        lock(&self.record).states.clone()
    }

    pub fn last_state(&self) -> Option<SurfaceState> {
        lock(&self.record).states.last().copied()
    }

    pub fn title(&self) -> Option<String> {
        lock(&self.record).title.clone()
    }

    pub fn user_agent(&self) -> Option<String> {
        lock(&self.record).user_agent.clone()
    }

    pub fn reloads(&self) -> usize {
        lock(&self.record).reloads
    }

    pub fn is_dismissed(&self) -> bool {
        lock(&self.record).dismissed
    }
}

#[async_trait]
impl ScriptEvaluator for HeadlessSurface {
    async fn evaluate_script(&self, script: &str) -> Result<String> {
        let mut record = lock(&self.record);
        if record.dismissed {
            return Err(BridgeError::Script("surface dismissed".into()));
        }
        record.evaluated.push(script.to_string());
        match record.queued_results.pop_front() {
            Some(Ok(result)) => Ok(result),
            Some(Err(reason)) => Err(BridgeError::Script(reason)),
            None => Ok(record
                .default_result
                .clone()
                .unwrap_or_else(|| "null".into())),
        }
    }
}

impl BrowsingSurface for HeadlessSurface {
    fn load_url(&self, url: &str) -> Result<()> {
        let mut record = lock(&self.record);
        if let Some(reason) = &record.load_failure {
            return Err(BridgeError::Bridge(reason.clone()));
        }
        record.loaded.push(url.to_string());
        record.current_url = Some(url.to_string());
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        lock(&self.record).reloads += 1;
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        lock(&self.record).current_url.clone()
    }

    fn set_title(&self, title: &str) {
        lock(&self.record).title = Some(title.to_string());
    }

    fn set_user_agent(&self, user_agent: &str) {
        lock(&self.record).user_agent = Some(user_agent.to_string());
    }

    fn set_state(&self, state: SurfaceState) {
        lock(&self.record).states.push(state);
    }

    fn dismiss(&self) {
        lock(&self.record).dismissed = true;
    }
}

// -- Platform ----------------------------------------------------------------

/// In-memory platform: cookie map, recorded browser launches, and sheets
/// backed by `HeadlessSurface`.
#[derive(Debug, Default)]
pub struct HeadlessBridge {
    cookies: Mutex<HashMap<String, String>>,
    opened_in_browser: Mutex<Vec<String>>,
    sheets: Mutex<Vec<Arc<HeadlessSurface>>>,
    sheet_load_failure: Mutex<Option<String>>,
}

impl HeadlessBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie string for a host.
    pub fn set_cookies(&self, host: impl Into<String>, header: impl Into<String>) {
        lock(&self.cookies).insert(host.into(), header.into());
    }

    pub fn opened_in_browser(&self) -> Vec<String> {
        lock(&self.opened_in_browser).clone()
    }

    /// Most recently opened sheet surface.
    pub fn last_sheet(&self) -> Option<Arc<HeadlessSurface>> {
        lock(&self.sheets).last().cloned()
    }

    /// Sheets opened from now on refuse to load pages.
    pub fn fail_sheet_loads(&self, reason: impl Into<String>) {
        *lock(&self.sheet_load_failure) = Some(reason.into());
    }

    pub fn sheet_count(&self) -> usize {
        lock(&self.sheets).len()
    }
}

impl PlatformBridge for HeadlessBridge {
    fn platform_name(&self) -> &str {
        "Headless"
    }
}

impl NativeCookieStore for HeadlessBridge {
    fn cookies_for(&self, url: &str) -> Result<Option<String>> {
        let host = host_of(url)?;
        Ok(lock(&self.cookies).get(&host).cloned())
    }
}

impl NativeBrowser for HeadlessBridge {
    fn open_external_browser(&self, url: &str) -> Result<()> {
        tracing::debug!(url, "headless bridge: open external browser");
        lock(&self.opened_in_browser).push(url.to_string());
        Ok(())
    }
}

impl NativeSheet for HeadlessBridge {
    fn open_secondary_surface(&self) -> Result<Arc<dyn BrowsingSurface>> {
        let surface = Arc::new(HeadlessSurface::new());
        if let Some(reason) = lock(&self.sheet_load_failure).clone() {
            surface.fail_loads(reason);
        }
        lock(&self.sheets).push(Arc::clone(&surface));
        Ok(surface)
    }
}

// -- HTTP --------------------------------------------------------------------

/// Canned HTTP responses keyed by URL.  Unknown URLs fail like a refused
/// connection.
#[derive(Debug, Default)]
pub struct HeadlessHttp {
    responses: Mutex<HashMap<String, HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl HeadlessHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        lock(&self.responses).insert(
            url.into(),
            HttpResponse {
                status,
                body: body.into(),
            },
        );
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl NativeHttp for HeadlessHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = lock(&self.responses).get(&request.url).cloned();
        let url = request.url.clone();
        lock(&self.requests).push(request);
        response.ok_or_else(|| BridgeError::Connectivity(format!("connection refused: {url}")))
    }
}
