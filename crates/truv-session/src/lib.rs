// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Truv session — the engine between the hosted flow and the host app.
//
// `BridgeView` drives the primary surface: it decodes page calls, fans
// events out to listeners, and tracks navigation.  START_EXTERNAL_LOGIN
// hands off to an `ExternalLoginSession`, which polls a DOM check on the
// secondary surface and reports harvested cookies back through
// `OutboundBridge`.

pub mod bridge_view;
pub mod dispatch;
pub mod external_login;
pub mod http;
pub mod navigation;
pub mod outbound;
pub mod detect;
pub mod relay;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge_view::BridgeView;
pub use dispatch::{ListenerRegistry, TruvEventsListener};
pub use external_login::{
    ExternalLoginObserver, ExternalLoginOutcome, ExternalLoginSession, SessionDeps,
};
pub use http::ReqwestHttp;
pub use navigation::{NavigationPhase, NavigationSignal, NavigationTracker};
pub use outbound::OutboundBridge;
pub use relay::CallbackRelay;
