// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The primary surface: hosts the Truv flow, decodes its calls, and fans them
// out to listeners.
//
// START_EXTERNAL_LOGIN opens a secondary surface and hands it to an
// `ExternalLoginSession`; OAUTH_OPENED opens the system browser.  Whether
// those two still reach listeners afterwards is the `InterceptPolicy`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};
use truv_bridge::{BrowsingSurface, NativeHttp, PlatformBridge};
use truv_core::channel::InboundCall;
use truv_core::error::{BridgeError, Result};
use truv_core::human_errors::humanize_navigation;
use truv_core::types::{
    InterceptPolicy, ListenerId, NavigationError, SheetState, SurfaceState,
};
use truv_core::{BridgeConfig, EventPayload, EventType, ExternalLoginConfig, SuccessPayload};

use crate::dispatch::{ListenerRegistry, TruvEventsListener};
use crate::external_login::{ExternalLoginObserver, ExternalLoginSession, SessionDeps};
use crate::navigation::{NavigationSignal, NavigationTracker};
use crate::outbound::OutboundBridge;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine behind the primary browsing surface.
pub struct BridgeView {
    config: BridgeConfig,
    surface: Arc<dyn BrowsingSurface>,
    platform: Arc<dyn PlatformBridge>,
    http: Arc<dyn NativeHttp>,
    listeners: Arc<ListenerRegistry>,
    navigation: Mutex<NavigationTracker>,
    outbound: Arc<OutboundBridge>,
    external: Mutex<Option<Arc<ExternalLoginSession>>>,
}

impl BridgeView {
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: BridgeConfig,
        surface: Arc<dyn BrowsingSurface>,
        platform: Arc<dyn PlatformBridge>,
        http: Arc<dyn NativeHttp>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;
        let outbound = Arc::new(OutboundBridge::new(
            Arc::clone(&surface),
            config.sdk.clone(),
            runtime,
        ));
        info!(platform = platform.platform_name(), "bridge view created");

        Ok(Self {
            navigation: Mutex::new(NavigationTracker::new(config.terminal_signal)),
            config,
            surface,
            platform,
            http,
            listeners: Arc::new(ListenerRegistry::new()),
            outbound,
            external: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn add_event_listener(&self, listener: Arc<dyn TruvEventsListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Registry handle, for listeners that manage their own registration.
    pub fn listeners(&self) -> Arc<ListenerRegistry> {
        Arc::clone(&self.listeners)
    }

    /// Load the hosted flow for `bridge_token`.
    #[instrument(skip_all)]
    pub fn load_bridge_token_url(&self, bridge_token: &str) -> Result<()> {
        if bridge_token.is_empty() {
            return Err(BridgeError::MissingField("bridge_token"));
        }
        let url = self.config.bridge_url(bridge_token);
        self.surface.set_state(SurfaceState::Loading);
        self.surface.load_url(&url)?;
        info!(url = %url, "hosted flow requested");
        Ok(())
    }

    /// Whether the page currently shown was loaded for `bridge_token`.
    pub fn has_bridge_token(&self, bridge_token: &str) -> bool {
        !bridge_token.is_empty()
            && self
                .surface
                .current_url()
                .is_some_and(|url| url.contains(bridge_token))
    }

    pub fn current_url(&self) -> Option<String> {
        self.surface.current_url()
    }

    /// Forward the hardware back button to the page.
    pub fn on_back_pressed(&self) {
        self.outbound.back();
    }

    /// Route a page-to-native call.
    ///
    /// `callbackInterface` and page messages belong to the external-login
    /// surface and are forwarded to the active session.
    pub fn handle_call(&self, interface: &str, method: &str, arg: Option<&str>) -> Result<()> {
        match InboundCall::decode(interface, method, arg)? {
            InboundCall::Success(raw) => self.on_success(&raw),
            InboundCall::Event(raw) => self.on_event(&raw),
            InboundCall::Close => self.on_close(),
            InboundCall::Load => self.on_load(),
            InboundCall::Error => self.on_error(),
            InboundCall::Callback(_) | InboundCall::PageMessage(_) => {
                match self.external_session() {
                    Some(session) => return session.handle_call(interface, method, arg),
                    None => warn!(interface, method, "no external login session for call"),
                }
            }
        }
        Ok(())
    }

    /// A success payload that fails to decode is reported as an error.
    pub fn on_success(&self, raw: &str) {
        match SuccessPayload::from_json(raw) {
            Ok(payload) => {
                info!(task_id = %payload.metadata.task_id, "link succeeded");
                self.listeners.notify_success(&payload);
            }
            Err(e) => {
                warn!(error = %e, "undecodable success payload");
                self.listeners.notify_error();
            }
        }
    }

    /// Decode and dispatch an event.  Undecodable events are dropped.
    pub fn on_event(&self, raw: &str) {
        let event = match EventPayload::from_json(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "dropping undecodable event");
                return;
            }
        };
        if event.event_type.requires_payload() && event.payload.is_none() {
            warn!(event_type = %event.event_type, "event arrived without its payload");
        }

        let handled = event.event_type.is_intercepted()
            && match event.event_type {
                EventType::StartExternalLogin => self.route_external_login(&event),
                _ => self.route_oauth(&event),
            };
        if handled && self.config.intercept_policy == InterceptPolicy::SuppressWhenHandled {
            debug!(event_type = %event.event_type, "intercepted event not forwarded");
            return;
        }
        self.listeners.notify_event(&event);
    }

    pub fn on_close(&self) {
        self.listeners.notify_close();
    }

    pub fn on_load(&self) {
        self.listeners.notify_load();
    }

    pub fn on_error(&self) {
        self.listeners.notify_error();
    }

    fn route_external_login(&self, event: &EventPayload) -> bool {
        let Some(config) = event.external_login_config() else {
            warn!("START_EXTERNAL_LOGIN without a usable login config");
            return false;
        };
        match self.start_external_login(config.clone()) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "could not start external login");
                false
            }
        }
    }

    fn route_oauth(&self, event: &EventPayload) -> bool {
        let Some(url) = event.url().filter(|u| !u.is_empty()) else {
            warn!("OAUTH_OPENED without a url");
            return false;
        };
        match self.platform.open_external_browser(url) {
            Ok(()) => true,
            Err(e) => {
                warn!(url, error = %e, "could not open external browser");
                false
            }
        }
    }

    /// Open the secondary surface and run an external login in it.  A
    /// session still running is cancelled first.  If the session cannot
    /// start, the sheet is dismissed and the page told the login was
    /// cancelled.
    pub fn start_external_login(
        &self,
        config: ExternalLoginConfig,
    ) -> Result<Arc<ExternalLoginSession>> {
        if let Some(previous) = lock(&self.external).take() {
            previous.dismiss_by_user();
        }

        let surface = self.platform.open_secondary_surface()?;
        let observer: Arc<dyn ExternalLoginObserver> = self.outbound.clone();
        let deps = SessionDeps {
            platform: Arc::clone(&self.platform),
            http: Arc::clone(&self.http),
            observer,
        };
        let session =
            match ExternalLoginSession::open(config, Arc::clone(&surface), deps, &self.config) {
                Ok(session) => Arc::new(session),
                Err(e) => {
                    surface.dismiss();
                    self.outbound.external_login_cancelled();
                    return Err(e);
                }
            };
        *lock(&self.external) = Some(Arc::clone(&session));
        Ok(session)
    }

    pub fn external_session(&self) -> Option<Arc<ExternalLoginSession>> {
        lock(&self.external).clone()
    }

    /// Sheet position of the secondary surface.
    pub fn on_sheet_state(&self, state: SheetState) {
        if let Some(session) = self.external_session() {
            session.on_sheet_state(state);
        }
    }

    // -- Navigation ----------------------------------------------------------

    pub fn on_page_started(&self, url: &str) {
        let signal = lock(&self.navigation).on_page_started(url);
        self.apply(signal);
    }

    pub fn on_request_intercepted(&self, url: &str) {
        lock(&self.navigation).on_request_intercepted(url);
    }

    pub fn on_commit_visible(&self, url: Option<&str>) {
        let signal = lock(&self.navigation).on_commit_visible(url);
        self.apply(signal);
    }

    pub fn on_page_finished(&self, url: Option<&str>) {
        let signal = lock(&self.navigation).on_page_finished(url);
        self.apply(signal);
    }

    /// Connectivity failures show the retry view.  Anything else closes.
    pub fn on_navigation_error(&self, error: &NavigationError) {
        let human = humanize_navigation(error.kind);
        warn!(
            url = error.url.as_deref(),
            kind = ?error.kind,
            description = %error.description,
            shown = %human.message,
            "navigation failed"
        );
        let signal = lock(&self.navigation).on_error(error);
        self.apply(Some(signal));
    }

    pub fn visited_urls(&self) -> Vec<String> {
        lock(&self.navigation).visited_urls().to_vec()
    }

    /// The retry button on the connection-error view.
    pub fn retry(&self) -> Result<()> {
        self.surface.set_state(SurfaceState::Loading);
        self.surface.reload()
    }

    fn apply(&self, signal: Option<NavigationSignal>) {
        match signal {
            Some(NavigationSignal::Started { url }) => {
                debug!(url = %url, "page started");
                self.surface.set_state(SurfaceState::Loading);
            }
            Some(NavigationSignal::Settled { url }) => {
                debug!(url = url.as_deref(), "content settled");
                self.surface.set_state(SurfaceState::Content);
            }
            Some(NavigationSignal::Failed { connectivity: true }) => {
                self.surface.set_state(SurfaceState::ConnectionError);
            }
            Some(NavigationSignal::Failed { connectivity: false }) => {
                self.listeners.notify_close();
            }
            None => {}
        }
    }
}
