// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared value types used at the seams between the engine and the platform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable handle for a registered event listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happens to START_EXTERNAL_LOGIN / OAUTH_OPENED events after they
/// have been routed to their dedicated handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptPolicy {
    /// Observers still receive the event.
    #[default]
    ForwardAlways,
    /// Observers do not see the event when a handler took it.
    SuppressWhenHandled,
}

/// Which page-lifecycle signal marks a navigation as settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalSignal {
    /// First visually committed paint (newer engines).
    #[default]
    CommitVisible,
    /// Full page finish.
    PageFinished,
}

/// HTTP verbs the bridge issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Parse a method name as sent by the hosted flow; anything that is not
    /// GET is treated as POST.
    pub fn from_wire(method: &str) -> Self {
        if method.trim().eq_ignore_ascii_case("GET") {
            Self::Get
        } else {
            Self::Post
        }
    }
}

/// A plain HTTP request handed to the platform HTTP capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: BTreeMap::new(),
            body: Some(body.into()),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Response returned by the platform HTTP capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Visible state of a browsing surface, driven by the navigation tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceState {
    /// A navigation is in flight (progress indicator shown).
    Loading,
    /// Page content is visible.
    Content,
    /// Blocking connection-error view with a retry button.
    ConnectionError,
}

/// Bottom-sheet positions reported by the host for the secondary surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetState {
    Expanded,
    Collapsed,
    Dragging,
    Settling,
    HalfExpanded,
    Hidden,
}

/// Class of a failed navigation as reported by the browser engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationErrorKind {
    HostLookup,
    Connect,
    Timeout,
    /// TLS, bad URL, unsupported scheme, blocked request and the rest.
    Other,
}

impl NavigationErrorKind {
    /// DNS, connect, and timeout failures get the retry UI; everything else
    /// only closes.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::HostLookup | Self::Connect | Self::Timeout)
    }
}

/// A failed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationError {
    pub url: Option<String>,
    pub kind: NavigationErrorKind,
    pub description: String,
}
