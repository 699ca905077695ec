// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native-to-page calls on the primary surface.
//
// Calls are fire-and-forget: each one is evaluated on a spawned task, its
// result goes to the debug log, and failures (page navigated away, surface
// gone) are logged and swallowed.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use truv_bridge::BrowsingSurface;
use truv_core::SuccessPayload;
use truv_core::config::SdkInfo;
use truv_core::cookie::CookieHarvest;
use truv_core::script::{BridgeScript, tag_payload};

use crate::external_login::{ExternalLoginObserver, ExternalLoginOutcome};

/// Invokes `window.bridge` callbacks in the hosted page.
pub struct OutboundBridge {
    surface: Arc<dyn BrowsingSurface>,
    sdk: SdkInfo,
    runtime: Handle,
}

impl OutboundBridge {
    pub fn new(surface: Arc<dyn BrowsingSurface>, sdk: SdkInfo, runtime: Handle) -> Self {
        Self {
            surface,
            sdk,
            runtime,
        }
    }

    /// Evaluate `script` in the background.
    pub fn invoke(&self, script: BridgeScript) -> JoinHandle<()> {
        let surface = Arc::clone(&self.surface);
        self.runtime.spawn(async move {
            let name = script.name();
            match surface.evaluate_script(&script.render()).await {
                Ok(result) => debug!(call = name, result = %result, "bridge call completed"),
                Err(e) => warn!(call = name, error = %e, "bridge call failed"),
            }
        })
    }

    pub fn back(&self) -> JoinHandle<()> {
        self.invoke(BridgeScript::BackPress)
    }

    pub fn external_login_cancelled(&self) -> JoinHandle<()> {
        self.invoke(BridgeScript::ExternalLoginCancel)
    }

    /// Relay a success reported by the external page, tagged with the SDK
    /// identity.  Falls back to the untagged payload when it is not an
    /// object.
    pub fn external_login_succeeded(&self, success: &SuccessPayload) -> JoinHandle<()> {
        let data = tag_payload(&success.raw_json, &self.sdk).unwrap_or_else(|e| {
            warn!(error = %e, "could not tag success payload; relaying as-is");
            success.raw_json.clone()
        });
        self.invoke(BridgeScript::ExternalLoginSuccess(data))
    }

    /// Relay harvested cookies and the final page URL.
    pub fn cookies_harvested(&self, harvest: &CookieHarvest) -> Option<JoinHandle<()>> {
        match harvest.to_bridge_json() {
            Ok(data) => Some(self.invoke(BridgeScript::ExternalLoginSuccess(data))),
            Err(e) => {
                warn!(error = %e, "could not encode cookie harvest");
                None
            }
        }
    }
}

impl ExternalLoginObserver for OutboundBridge {
    fn on_outcome(&self, outcome: ExternalLoginOutcome) {
        match outcome {
            ExternalLoginOutcome::Harvested(harvest) => {
                debug!(cookies = harvest.cookies.len(), "relaying cookie harvest");
                self.cookies_harvested(&harvest);
            }
            ExternalLoginOutcome::Succeeded(success) => {
                self.external_login_succeeded(&success);
            }
            ExternalLoginOutcome::Cancelled => {
                self.external_login_cancelled();
            }
        }
    }
}
