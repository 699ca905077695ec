// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{InterceptPolicy, TerminalSignal};

/// Hosted page, relative to the CDN.
const HOSTED_PAGE: &str = "mobile.html";

/// Feature flag that enables the external-login flow in the hosted page.
const EXTERNAL_APP_LOGIN_FLAG: &str = "__TruvExternalFeatures=external_app_login";

/// Mobile Chrome UA used by the external-login surface; some providers
/// refuse embedded-browser agents.
const EXTERNAL_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.210 Mobile Safari/537.36";

/// Identity of this SDK build as reported to the hosted flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkInfo {
    /// Platform identifier, e.g. "android".
    pub platform: String,
    /// SDK version string.
    pub version: String,
}

impl Default for SdkInfo {
    fn default() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl SdkInfo {
    /// Value of the `sdk=` query parameter.
    pub fn query_value(&self) -> String {
        format!("{}:{}", self.platform, self.version)
    }

    /// Diagnostic tags appended to payloads relayed back into the page.
    pub fn tags(&self) -> Vec<String> {
        vec![
            format!("platform:{}", self.platform),
            format!("sdk-version:{}", self.version),
            format!("source:{}-sdk", self.platform),
        ]
    }
}

/// Settings for a bridge instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// CDN serving the hosted flow.
    pub cdn_url: String,
    /// SDK identity.
    pub sdk: SdkInfo,
    /// Interval between external-login checks, in milliseconds.
    pub polling_interval_ms: u64,
    /// Timeout applied to every outbound HTTP request, in seconds.
    pub http_timeout_secs: u64,
    /// Whether intercepted events still reach observers.
    pub intercept_policy: InterceptPolicy,
    /// Lifecycle signal that settles a navigation.
    pub terminal_signal: TerminalSignal,
    /// User agent for the external-login surface.
    pub external_user_agent: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cdn_url: "https://cdn.truv.com".into(),
            sdk: SdkInfo::default(),
            polling_interval_ms: 1_000,
            http_timeout_secs: 30,
            intercept_policy: InterceptPolicy::default(),
            terminal_signal: TerminalSignal::default(),
            external_user_agent: EXTERNAL_USER_AGENT.into(),
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file.  Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Entry URL of the hosted flow for a bridge token.
    pub fn bridge_url(&self, bridge_token: &str) -> String {
        format!(
            "{}/{HOSTED_PAGE}?bridge_token={bridge_token}&{EXTERNAL_APP_LOGIN_FLAG}&sdk={}",
            self.cdn_url.trim_end_matches('/'),
            self.sdk.query_value()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn android() -> SdkInfo {
        SdkInfo {
            platform: "android".into(),
            version: "1.4.0".into(),
        }
    }

    #[test]
    fn bridge_url_carries_token_and_flags() {
        let config = BridgeConfig {
            sdk: android(),
            ..Default::default()
        };
        assert_eq!(
            config.bridge_url("abc123"),
            "https://cdn.truv.com/mobile.html?bridge_token=abc123&__TruvExternalFeatures=external_app_login&sdk=android:1.4.0"
        );
    }

    #[test]
    fn tags_are_fixed_diagnostics() {
        assert_eq!(
            android().tags(),
            vec!["platform:android", "sdk-version:1.4.0", "source:android-sdk"]
        );
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.json");
        std::fs::write(&path, r#"{"polling_interval_ms":250,"intercept_policy":"suppress_when_handled"}"#)
            .unwrap();

        let config = BridgeConfig::load(&path).unwrap();
        assert_eq!(config.polling_interval(), Duration::from_millis(250));
        assert_eq!(config.intercept_policy, InterceptPolicy::SuppressWhenHandled);
        assert_eq!(config.cdn_url, "https://cdn.truv.com");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BridgeConfig::load(dir.path().join("absent.json")),
            Err(crate::BridgeError::Io(_))
        ));
    }
}
