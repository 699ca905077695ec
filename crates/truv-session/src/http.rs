// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `NativeHttp` on top of reqwest, for hosts without their own HTTP stack.

use std::time::Duration;

use async_trait::async_trait;
use truv_bridge::NativeHttp;
use truv_core::error::{BridgeError, Result};
use truv_core::types::{HttpMethod, HttpRequest, HttpResponse};

/// reqwest-backed HTTP client with a per-request timeout.
#[derive(Clone)]
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Http(format!("client setup: {e}")))?;
        Ok(Self { client })
    }
}

/// Timeouts and refused/failed connects are connectivity failures; the rest
/// (bad URL, TLS, truncated body) are plain HTTP failures.
fn classify(err: reqwest::Error) -> BridgeError {
    if err.is_timeout() || err.is_connect() {
        BridgeError::Connectivity(err.to_string())
    } else {
        BridgeError::Http(err.to_string())
    }
}

#[async_trait]
impl NativeHttp for ReqwestHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(classify)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}
