// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External-login sub-session.
//
// The session loads a third-party login page in the secondary surface and
// polls a DOM check until the page reports that the user is signed in.  It
// then reads the engine's cookies for every URL the surface visited, hands
// them to the observer, and dismisses the surface.
//
// One poller task owns the check loop, so at most one evaluation is in flight.
// Ticks that fall due while a check runs are skipped, not queued.  The task
// handle sits in a single slot and is aborted before a replacement starts
// and when the session is dismissed or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};
use truv_bridge::{BrowsingSurface, NativeHttp, PlatformBridge};
use truv_core::channel::{InboundCall, is_logged_in_message};
use truv_core::cookie::{
    CookieHarvest, dedupe_latest, domain_from_url, host_of, parse_cookie_header,
    top_level_domain,
};
use truv_core::error::{BridgeError, Result};
use truv_core::human_errors::humanize_error;
use truv_core::types::{HttpRequest, NavigationError, SheetState, SurfaceState};
use truv_core::{BridgeConfig, ExternalLoginConfig, LoginDetection, SuccessPayload};

use crate::detect::{LoginVerdict, selector_check_script};
use crate::navigation::{NavigationSignal, NavigationTracker};
use crate::relay::CallbackRelay;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How an external login ended.  Exactly one is delivered per session.
#[derive(Debug, Clone)]
pub enum ExternalLoginOutcome {
    /// The check saw the login complete; cookies were collected.
    Harvested(CookieHarvest),
    /// The external page reported success itself.
    Succeeded(SuccessPayload),
    /// The user dismissed the surface first.
    Cancelled,
}

/// Receives the outcome of an external login.
pub trait ExternalLoginObserver: Send + Sync {
    fn on_outcome(&self, outcome: ExternalLoginOutcome);
}

/// Host capabilities a session needs besides its surface.
#[derive(Clone)]
pub struct SessionDeps {
    pub platform: Arc<dyn PlatformBridge>,
    pub http: Arc<dyn NativeHttp>,
    pub observer: Arc<dyn ExternalLoginObserver>,
}

struct SessionInner {
    config: ExternalLoginConfig,
    surface: Arc<dyn BrowsingSurface>,
    deps: SessionDeps,
    relay: CallbackRelay,
    navigation: Mutex<NavigationTracker>,
    /// Remote detection script, kept once fetched successfully.
    script_cache: Mutex<Option<String>>,
    logged_in: Notify,
    check_now: Notify,
    finished: AtomicBool,
    check_failed: AtomicBool,
    interval: Duration,
    opened_at: DateTime<Utc>,
    runtime: Handle,
}

/// A running external-login sub-session.
pub struct ExternalLoginSession {
    inner: Arc<SessionInner>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl ExternalLoginSession {
    /// Load the login page in `surface` and start probing.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(url = %config.url))]
    pub fn open(
        config: ExternalLoginConfig,
        surface: Arc<dyn BrowsingSurface>,
        deps: SessionDeps,
        settings: &BridgeConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| BridgeError::NoRuntime)?;

        surface.set_user_agent(&settings.external_user_agent);
        surface.set_title(&domain_from_url(&config.url));
        surface.set_state(SurfaceState::Loading);
        surface.load_url(&config.url)?;

        let mut navigation = NavigationTracker::new(settings.terminal_signal);
        navigation.record_visit(&config.url);

        let relay = CallbackRelay::new(Arc::clone(&deps.http));
        let session = Self {
            inner: Arc::new(SessionInner {
                config,
                surface,
                deps,
                relay,
                navigation: Mutex::new(navigation),
                script_cache: Mutex::new(None),
                logged_in: Notify::new(),
                check_now: Notify::new(),
                finished: AtomicBool::new(false),
                check_failed: AtomicBool::new(false),
                interval: settings.polling_interval(),
                opened_at: Utc::now(),
                runtime,
            }),
            poller: Mutex::new(None),
        };
        session.start_polling();
        info!("external login session opened");
        Ok(session)
    }

    pub fn config(&self) -> &ExternalLoginConfig {
        &self.inner.config
    }

    /// When the login page was first requested.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.inner.opened_at
    }

    /// Whether an outcome has been delivered.
    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    pub fn visited_urls(&self) -> Vec<String> {
        lock(&self.inner.navigation).visited_urls().to_vec()
    }

    /// (Re)start the check loop, cancelling any running one.
    pub fn start_polling(&self) {
        if self.is_finished() {
            return;
        }
        let mut slot = lock(&self.poller);
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        let inner = Arc::clone(&self.inner);
        *slot = Some(self.inner.runtime.spawn(poll_loop(inner)));
    }

    /// Cancel the check loop and any evaluation in flight.  Safe to call twice.
    pub fn stop_polling(&self) {
        if let Some(poller) = lock(&self.poller).take() {
            poller.abort();
            debug!("external login polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        lock(&self.poller)
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    /// Route a call made by the external page.
    pub fn handle_call(&self, interface: &str, method: &str, arg: Option<&str>) -> Result<()> {
        match InboundCall::decode(interface, method, arg)? {
            InboundCall::Success(raw) => {
                let success = SuccessPayload::from_json(&raw)?;
                self.stop_polling();
                if self.inner.finish() {
                    self.inner.surface.dismiss();
                    self.inner
                        .deps
                        .observer
                        .on_outcome(ExternalLoginOutcome::Succeeded(success));
                }
            }
            InboundCall::Callback(response) => {
                let inner = Arc::clone(&self.inner);
                self.inner.runtime.spawn(async move {
                    match inner.relay.relay(&inner.config, &response).await {
                        Ok(_) => {}
                        Err(e) if e.is_connectivity() => {
                            warn!(error = %e, "callback endpoint unreachable");
                        }
                        Err(e) => warn!(error = %e, "callback relay failed"),
                    }
                });
            }
            InboundCall::PageMessage(message) => {
                if is_logged_in_message(&message) {
                    debug!("page reported login");
                    self.inner.logged_in.notify_one();
                } else {
                    debug!(body = %message, "ignoring page message");
                }
            }
            InboundCall::Event(raw) => debug!(event = %raw, "event from external page"),
            InboundCall::Close | InboundCall::Load | InboundCall::Error => {
                debug!(method, "lifecycle call from external page");
            }
        }
        Ok(())
    }

    pub fn on_page_started(&self, url: &str) {
        let signal = lock(&self.inner.navigation).on_page_started(url);
        self.inner.apply(signal);
    }

    pub fn on_request_intercepted(&self, url: &str) {
        lock(&self.inner.navigation).on_request_intercepted(url);
    }

    pub fn on_commit_visible(&self, url: Option<&str>) {
        let signal = lock(&self.inner.navigation).on_commit_visible(url);
        self.inner.apply(signal);
    }

    pub fn on_page_finished(&self, url: Option<&str>) {
        let signal = lock(&self.inner.navigation).on_page_finished(url);
        self.inner.apply(signal);
    }

    pub fn on_navigation_error(&self, error: &NavigationError) {
        warn!(
            url = error.url.as_deref(),
            kind = ?error.kind,
            description = %error.description,
            "external login navigation failed"
        );
        let signal = lock(&self.inner.navigation).on_error(error);
        self.inner.apply(Some(signal));
    }

    /// Reload after a connection error.
    pub fn retry(&self) -> Result<()> {
        self.inner.surface.set_state(SurfaceState::Loading);
        self.inner.surface.reload()?;
        if !self.is_polling() {
            self.start_polling();
        }
        Ok(())
    }

    /// Bottom-sheet position changes.  Hidden counts as a dismissal.
    pub fn on_sheet_state(&self, state: SheetState) {
        if state == SheetState::Hidden {
            self.dismiss_by_user();
        }
    }

    /// The user closed the surface.  Reports cancellation unless an outcome
    /// was already delivered.
    pub fn dismiss_by_user(&self) {
        self.stop_polling();
        if self.inner.finish() {
            info!("external login cancelled by user");
            self.inner.surface.dismiss();
            self.inner
                .deps
                .observer
                .on_outcome(ExternalLoginOutcome::Cancelled);
        }
    }
}

impl Drop for ExternalLoginSession {
    fn drop(&mut self) {
        if let Some(poller) = lock(&self.poller).take() {
            poller.abort();
        }
    }
}

impl SessionInner {
    /// Claim the single outcome slot.  True for the first caller only.
    fn finish(&self) -> bool {
        !self.finished.swap(true, Ordering::SeqCst)
    }

    fn apply(&self, signal: Option<NavigationSignal>) {
        match signal {
            Some(NavigationSignal::Started { .. }) => self.surface.set_state(SurfaceState::Loading),
            Some(NavigationSignal::Settled { .. }) => {
                self.surface.set_state(SurfaceState::Content);
                self.check_now.notify_one();
            }
            Some(NavigationSignal::Failed { connectivity: true }) => {
                self.surface.set_state(SurfaceState::ConnectionError);
            }
            Some(NavigationSignal::Failed { connectivity: false }) | None => {}
        }
    }

    async fn check_script(&self) -> Result<String> {
        let url = match &self.config.detection {
            LoginDetection::Selector(selector) => return Ok(selector_check_script(selector)),
            LoginDetection::RemoteScript(url) => url,
        };
        if let Some(script) = lock(&self.script_cache).clone() {
            return Ok(script);
        }

        let response = self.deps.http.execute(HttpRequest::get(url.as_str())).await?;
        if !response.is_success() {
            return Err(BridgeError::Http(format!(
                "detection script fetch returned {}",
                response.status
            )));
        }
        debug!(url = %url, bytes = response.body.len(), "detection script fetched");
        *lock(&self.script_cache) = Some(response.body.clone());
        Ok(response.body)
    }

    async fn check_once(&self) -> Result<LoginVerdict> {
        let script = self.check_script().await?;
        let result = self.surface.evaluate_script(&script).await?;
        Ok(LoginVerdict::from_evaluation(&result))
    }

    /// Collect cookies for every visited URL and deliver them.
    fn harvest(&self) {
        if !self.finish() {
            return;
        }

        let visited = lock(&self.navigation).visited_urls().to_vec();
        let mut cookies = Vec::new();
        for url in &visited {
            let host = match host_of(url) {
                Ok(host) => host,
                Err(e) => {
                    debug!(url = %url, error = %e, "skipping unparseable visited url");
                    continue;
                }
            };
            match self.deps.platform.cookies_for(url) {
                Ok(Some(header)) => {
                    cookies.extend(parse_cookie_header(&header, &top_level_domain(&host)));
                }
                Ok(None) => {}
                Err(e) => warn!(url = %url, error = %e, "cookie store lookup failed"),
            }
        }
        let cookies = dedupe_latest(cookies);
        let page_url = self
            .surface
            .current_url()
            .unwrap_or_else(|| self.config.url.clone());

        let harvest = CookieHarvest::new(cookies, page_url);
        let elapsed = harvest.captured_at - self.opened_at;
        info!(
            cookies = harvest.cookies.len(),
            urls = visited.len(),
            elapsed_ms = elapsed.num_milliseconds(),
            "external login complete"
        );
        self.deps
            .observer
            .on_outcome(ExternalLoginOutcome::Harvested(harvest));
        self.surface.dismiss();
    }
}

async fn poll_loop(inner: Arc<SessionInner>) {
    let mut ticker = tokio::time::interval(inner.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = inner.logged_in.notified() => {
                inner.harvest();
                return;
            }
            _ = ticker.tick() => {}
            _ = inner.check_now.notified() => {}
        }
        if inner.finished.load(Ordering::SeqCst) {
            return;
        }

        match inner.check_once().await {
            Ok(verdict) => {
                // A navigation still in flight keeps its spinner; settling
                // shows the content.
                if inner.check_failed.swap(false, Ordering::SeqCst)
                    && !lock(&inner.navigation).is_loading()
                {
                    inner.surface.set_state(SurfaceState::Content);
                }
                if verdict == LoginVerdict::LoggedIn {
                    inner.harvest();
                    return;
                }
            }
            Err(e) => {
                let human = humanize_error(&e);
                warn!(
                    error = %e,
                    shown = %human.message,
                    retriable = human.retriable,
                    "login check failed"
                );
                inner.check_failed.store(true, Ordering::SeqCst);
                inner.surface.set_state(SurfaceState::ConnectionError);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use truv_bridge::{HeadlessBridge, HeadlessHttp, HeadlessSurface, ScriptEvaluator};
    use truv_core::channel::{CALLBACK_INTERFACE, CITADEL_INTERFACE, PAGE_MESSAGE_INTERFACE};
    use truv_core::event::{CallbackScript, LoginCheck};
    use truv_core::types::NavigationErrorKind;

    use super::*;
    use crate::testing::{RecordingObserver, wait_until};

    const LOGIN_URL: &str = "https://login.example.com/signin";
    const SCRIPT_URL: &str = "https://cdn.example.com/detect.js";

    /// Surface whose script evaluations hang until `release` is notified.
    #[derive(Default)]
    struct GatedSurface {
        inner: HeadlessSurface,
        release: Notify,
        started: AtomicUsize,
    }

    impl GatedSurface {
        fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScriptEvaluator for GatedSurface {
        async fn evaluate_script(&self, script: &str) -> Result<String> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            self.inner.evaluate_script(script).await
        }
    }

    impl BrowsingSurface for GatedSurface {
        fn load_url(&self, url: &str) -> Result<()> {
            self.inner.load_url(url)
        }

        fn reload(&self) -> Result<()> {
            self.inner.reload()
        }

        fn current_url(&self) -> Option<String> {
            self.inner.current_url()
        }

        fn set_title(&self, title: &str) {
            self.inner.set_title(title);
        }

        fn set_user_agent(&self, user_agent: &str) {
            self.inner.set_user_agent(user_agent);
        }

        fn set_state(&self, state: SurfaceState) {
            self.inner.set_state(state);
        }

        fn dismiss(&self) {
            self.inner.dismiss();
        }
    }

    struct Fixture {
        surface: Arc<HeadlessSurface>,
        bridge: Arc<HeadlessBridge>,
        http: Arc<HeadlessHttp>,
        observer: Arc<RecordingObserver>,
    }

    impl Fixture {
        fn new() -> Self {
            let surface = Arc::new(HeadlessSurface::new());
            surface.set_default_result("false");
            Self {
                surface,
                bridge: Arc::new(HeadlessBridge::new()),
                http: Arc::new(HeadlessHttp::new()),
                observer: Arc::new(RecordingObserver::default()),
            }
        }

        fn deps(&self) -> SessionDeps {
            SessionDeps {
                platform: self.bridge.clone(),
                http: self.http.clone(),
                observer: self.observer.clone(),
            }
        }

        fn open(&self, config: ExternalLoginConfig) -> ExternalLoginSession {
            let settings = BridgeConfig {
                polling_interval_ms: 10,
                ..BridgeConfig::default()
            };
            ExternalLoginSession::open(
                config,
                self.surface.clone(),
                SessionDeps {
                    platform: self.bridge.clone(),
                    http: self.http.clone(),
                    observer: self.observer.clone(),
                },
                &settings,
            )
            .unwrap()
        }
    }

    fn selector_config() -> ExternalLoginConfig {
        ExternalLoginConfig::derive(
            Some(LOGIN_URL),
            Some(&LoginCheck {
                selector: Some("#dashboard".into()),
            }),
            None,
        )
        .unwrap()
    }

    fn script_config() -> ExternalLoginConfig {
        ExternalLoginConfig::derive(
            Some(LOGIN_URL),
            None,
            Some(&CallbackScript {
                url: Some(SCRIPT_URL.into()),
                callback_url: Some("https://api.example.com/cb".into()),
                callback_method: Some("POST".into()),
                callback_headers: None,
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn open_prepares_surface() {
        let fx = Fixture::new();
        let session = fx.open(selector_config());

        assert_eq!(fx.surface.loaded_urls(), vec![LOGIN_URL]);
        assert_eq!(fx.surface.title().as_deref(), Some("login.example.com"));
        assert!(fx.surface.user_agent().unwrap().contains("Mobile"));
        assert_eq!(fx.surface.states()[0], SurfaceState::Loading);
        assert_eq!(session.visited_urls(), vec![LOGIN_URL]);
        assert!(session.is_polling());
    }

    #[tokio::test]
    async fn selector_check_harvests_cookies() {
        let fx = Fixture::new();
        fx.bridge.set_cookies("login.example.com", "sid=1; token=a=b");
        fx.bridge.set_cookies("www.example.com", "sid=2");
        fx.surface.push_result("false");
        fx.surface.push_result("true");

        let session = fx.open(selector_config());
        session.on_page_started("https://www.example.com/home");
        fx.surface.set_current_url("https://www.example.com/home");

        wait_until(|| session.is_finished()).await;

        let outcomes = fx.observer.outcomes();
        assert_eq!(outcomes.len(), 1);
        let ExternalLoginOutcome::Harvested(harvest) = &outcomes[0] else {
            panic!("expected harvest, got {outcomes:?}");
        };
        assert_eq!(harvest.page_url, "https://www.example.com/home");
        assert_eq!(harvest.cookies.len(), 2);
        let sid = harvest.cookies.iter().find(|c| c.name == "sid").unwrap();
        assert_eq!(sid.value, "2");
        assert_eq!(sid.domain, ".example.com");
        let token = harvest.cookies.iter().find(|c| c.name == "token").unwrap();
        assert_eq!(token.value, "a=b");
        assert!(harvest.captured_at >= session.opened_at());
        assert!(fx.surface.is_dismissed());
        assert!(fx.surface.evaluated_scripts()[0].contains("#dashboard"));
    }

    #[tokio::test]
    async fn remote_script_is_fetched_once() {
        let fx = Fixture::new();
        fx.http.respond(SCRIPT_URL, 200, "checkLogin()");

        let session = fx.open(script_config());
        wait_until(|| fx.surface.evaluated_scripts().len() >= 3).await;
        session.stop_polling();

        assert_eq!(fx.http.requests().len(), 1);
        assert!(
            fx.surface
                .evaluated_scripts()
                .iter()
                .all(|s| s == "checkLogin()")
        );
        assert!(!session.is_finished());
    }

    #[tokio::test]
    async fn fetch_failure_shows_error_and_keeps_polling() {
        let fx = Fixture::new();
        let session = fx.open(script_config());

        wait_until(|| fx.http.requests().len() >= 2).await;
        assert!(fx.surface.states().contains(&SurfaceState::ConnectionError));

        // The script becomes reachable: the loop recovers on its own.
        fx.http.respond(SCRIPT_URL, 200, "checkLogin()");
        wait_until(|| fx.surface.last_state() == Some(SurfaceState::Content)).await;
        assert!(session.is_polling());
        session.stop_polling();
    }

    #[tokio::test]
    async fn recovery_keeps_spinner_while_navigating() {
        let fx = Fixture::new();
        let session = fx.open(script_config());
        wait_until(|| fx.surface.last_state() == Some(SurfaceState::ConnectionError)).await;

        session.on_page_started("https://login.example.com/mfa");
        fx.http.respond(SCRIPT_URL, 200, "checkLogin()");
        wait_until(|| !fx.surface.evaluated_scripts().is_empty()).await;
        assert_eq!(fx.surface.last_state(), Some(SurfaceState::Loading));

        session.on_commit_visible(Some("https://login.example.com/mfa"));
        assert_eq!(fx.surface.last_state(), Some(SurfaceState::Content));
        session.stop_polling();
    }

    #[tokio::test]
    async fn one_evaluation_in_flight_at_a_time() {
        let fx = Fixture::new();
        let gated = Arc::new(GatedSurface::default());
        gated.inner.set_default_result("false");
        let settings = BridgeConfig {
            polling_interval_ms: 10,
            ..BridgeConfig::default()
        };
        let session =
            ExternalLoginSession::open(selector_config(), gated.clone(), fx.deps(), &settings)
                .unwrap();

        // Ten intervals pass while the first evaluation hangs.
        wait_until(|| gated.started() == 1).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(gated.started(), 1);

        // Released: exactly one follow-up evaluation, not a backlog of ticks.
        gated.release.notify_one();
        wait_until(|| gated.started() == 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gated.started(), 2);
        assert_eq!(gated.inner.evaluated_scripts().len(), 1);

        // Stopping cancels the evaluation still waiting.
        session.stop_polling();
        gated.release.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(gated.inner.evaluated_scripts().len(), 1);
        assert!(!session.is_polling());
    }

    #[tokio::test]
    async fn logged_in_message_triggers_harvest() {
        let fx = Fixture::new();
        fx.bridge.set_cookies("login.example.com", "sid=1");
        let session = fx.open(selector_config());

        session
            .handle_call(
                PAGE_MESSAGE_INTERFACE,
                "postMessage",
                Some(r#"{"event":"logged_in"}"#),
            )
            .unwrap();
        wait_until(|| session.is_finished()).await;

        assert!(matches!(
            fx.observer.outcomes()[..],
            [ExternalLoginOutcome::Harvested(_)]
        ));
    }

    #[tokio::test]
    async fn hidden_sheet_cancels_once() {
        let fx = Fixture::new();
        let session = fx.open(selector_config());

        session.on_sheet_state(SheetState::Dragging);
        assert!(!session.is_finished());

        session.on_sheet_state(SheetState::Hidden);
        session.dismiss_by_user();

        assert!(matches!(
            fx.observer.outcomes()[..],
            [ExternalLoginOutcome::Cancelled]
        ));
        assert!(fx.surface.is_dismissed());
        assert!(!session.is_polling());
    }

    #[tokio::test]
    async fn page_success_is_reported() {
        let fx = Fixture::new();
        let session = fx.open(selector_config());

        session
            .handle_call(
                CITADEL_INTERFACE,
                "onSuccess",
                Some(r#"{"public_token":"pt","metadata":{"task_id":"t"}}"#),
            )
            .unwrap();

        let outcomes = fx.observer.outcomes();
        let [ExternalLoginOutcome::Succeeded(success)] = &outcomes[..] else {
            panic!("expected success, got {outcomes:?}");
        };
        assert_eq!(success.public_token, "pt");
        assert!(fx.surface.is_dismissed());

        // A late dismissal reports nothing more.
        session.dismiss_by_user();
        assert_eq!(fx.observer.outcomes().len(), 1);
    }

    #[tokio::test]
    async fn callback_is_relayed() {
        let fx = Fixture::new();
        fx.http.respond(SCRIPT_URL, 200, "checkLogin()");
        fx.http.respond("https://api.example.com/cb", 200, "");
        let session = fx.open(script_config());

        session
            .handle_call(CALLBACK_INTERFACE, "call", Some(r#"{"source":"x"}"#))
            .unwrap();
        wait_until(|| {
            fx.http
                .requests()
                .iter()
                .any(|r| r.url == "https://api.example.com/cb")
        })
        .await;
        session.stop_polling();
    }

    #[tokio::test]
    async fn settled_page_checks_immediately() {
        let fx = Fixture::new();
        let settings = BridgeConfig {
            polling_interval_ms: 60_000,
            ..BridgeConfig::default()
        };
        let session = ExternalLoginSession::open(
            selector_config(),
            fx.surface.clone(),
            SessionDeps {
                platform: fx.bridge.clone(),
                http: fx.http.clone(),
                observer: fx.observer.clone(),
            },
            &settings,
        )
        .unwrap();

        // The first tick fires at once; the next one is a minute away.
        wait_until(|| fx.surface.evaluated_scripts().len() == 1).await;
        session.on_page_started(LOGIN_URL);
        session.on_commit_visible(Some(LOGIN_URL));
        wait_until(|| fx.surface.evaluated_scripts().len() == 2).await;
        assert_eq!(fx.surface.last_state(), Some(SurfaceState::Content));
    }

    #[tokio::test]
    async fn connectivity_error_shows_retry_ui() {
        let fx = Fixture::new();
        let session = fx.open(selector_config());
        session.stop_polling();

        session.on_navigation_error(&NavigationError {
            url: Some(LOGIN_URL.into()),
            kind: NavigationErrorKind::Timeout,
            description: "net::ERR_TIMED_OUT".into(),
        });
        assert_eq!(fx.surface.last_state(), Some(SurfaceState::ConnectionError));

        session.retry().unwrap();
        assert_eq!(fx.surface.reloads(), 1);
        assert!(session.is_polling());
        session.stop_polling();
        session.stop_polling();
    }

    #[test]
    fn open_requires_runtime() {
        let fx = Fixture::new();
        let result = ExternalLoginSession::open(
            selector_config(),
            fx.surface.clone(),
            SessionDeps {
                platform: fx.bridge.clone(),
                http: fx.http.clone(),
                observer: fx.observer.clone(),
            },
            &BridgeConfig::default(),
        );
        assert!(matches!(result, Err(BridgeError::NoRuntime)));
    }
}
