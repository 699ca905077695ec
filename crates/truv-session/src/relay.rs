// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Relay of `callbackInterface.call` responses to the configured callback URL.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use truv_bridge::NativeHttp;
use truv_core::channel::MiddlewareResponse;
use truv_core::error::{BridgeError, Result};
use truv_core::types::{HttpMethod, HttpRequest, HttpResponse};
use truv_core::ExternalLoginConfig;

const CONTENT_TYPE: &str = "Content-Type";
const ACCESS_TOKEN: &str = "X-Access-Token";

/// Sends the external-login script's result to the callback URL.
#[derive(Clone)]
pub struct CallbackRelay {
    http: Arc<dyn NativeHttp>,
}

impl CallbackRelay {
    pub fn new(http: Arc<dyn NativeHttp>) -> Self {
        Self { http }
    }

    /// Build the callback request for `response`.
    ///
    /// Both headers are always present, empty when the config has no value.
    pub fn build_request(config: &ExternalLoginConfig, response: &str) -> Result<HttpRequest> {
        let url = config
            .callback_url()
            .ok_or(BridgeError::MissingField("script.callback_url"))?;
        let method = config
            .script
            .as_ref()
            .and_then(|s| s.callback_method.as_deref())
            .map(HttpMethod::from_wire)
            .unwrap_or(HttpMethod::Post);
        let headers = config.callback_headers();

        let mut request = HttpRequest::post(url, response)
            .with_header(CONTENT_TYPE, headers.content_type.unwrap_or_default())
            .with_header(ACCESS_TOKEN, headers.x_access_token.unwrap_or_default());
        request.method = method;
        Ok(request)
    }

    /// POST the raw response.  The body is decoded only for the log.
    #[instrument(skip_all, fields(url = config.callback_url()))]
    pub async fn relay(&self, config: &ExternalLoginConfig, response: &str) -> Result<HttpResponse> {
        match MiddlewareResponse::from_json(response) {
            Ok(decoded) => debug!(
                installation_id = decoded.installation_id.as_deref(),
                source = decoded.source.as_deref(),
                "relaying middleware response"
            ),
            Err(e) => warn!(error = %e, "middleware response is not valid JSON; relaying as-is"),
        }

        let request = Self::build_request(config, response)?;
        let reply = self.http.execute(request).await?;
        if reply.is_success() {
            info!(status = reply.status, "callback relayed");
        } else {
            warn!(status = reply.status, "callback endpoint rejected relay");
        }
        Ok(reply)
    }
}
