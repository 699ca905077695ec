// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the capabilities the bridge needs
// from its host: a scriptable browsing surface, the engine's cookie store,
// an HTTP client, and the host UI shell.

use std::sync::Arc;

use async_trait::async_trait;
use truv_core::error::Result;
use truv_core::types::{HttpRequest, HttpResponse, SurfaceState};

/// Unified bridge that groups the host-provided capabilities.
pub trait PlatformBridge: NativeCookieStore + NativeBrowser + NativeSheet + Send + Sync {
    /// Human-readable platform name (e.g. "Android 14").
    fn platform_name(&self) -> &str;
}

/// Evaluate script in a page.
#[async_trait]
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluate `script` in the current page and resolve with the
    /// JSON-encoded result (`"false"`, `"\"text\""`, `"null"`).
    ///
    /// Fails when the page is gone or the engine rejected the script.
    async fn evaluate_script(&self, script: &str) -> Result<String>;
}

/// One embedded browser view.
pub trait BrowsingSurface: ScriptEvaluator {
    /// Start loading `url`.
    fn load_url(&self, url: &str) -> Result<()>;

    /// Reload the current page (retry button).
    fn reload(&self) -> Result<()>;

    /// URL of the page currently shown, if any.
    fn current_url(&self) -> Option<String>;

    /// Set the title bar text.
    fn set_title(&self, title: &str);

    /// Override the engine's user agent.
    fn set_user_agent(&self, user_agent: &str);

    /// Switch between loading indicator, content, and the error view.
    fn set_state(&self, state: SurfaceState);

    /// Tear the surface down.  Must be idempotent.
    fn dismiss(&self);
}

/// The browser engine's persistent cookie store.
pub trait NativeCookieStore: Send + Sync {
    /// `name=value; name=value` string for `url`, or None when the store has
    /// nothing for it.
    fn cookies_for(&self, url: &str) -> Result<Option<String>>;
}

/// Plain HTTP.
#[async_trait]
pub trait NativeHttp: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// The system browser / custom tab.
pub trait NativeBrowser: Send + Sync {
    /// Open `url` outside the app (OAuth flows).
    fn open_external_browser(&self, url: &str) -> Result<()>;
}

/// The bottom sheet hosting the external-login surface.
pub trait NativeSheet: Send + Sync {
    /// Present the sheet and hand back its browsing surface.
    fn open_secondary_surface(&self) -> Result<Arc<dyn BrowsingSurface>>;
}
