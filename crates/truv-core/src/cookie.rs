// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simplified cookie records harvested after an external login.
//
// The platform cookie store only hands back `name=value; name=value` strings,
// so attributes are fixed: leading-dot top-level domain, path "/", not
// secure, not HTTP-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BridgeError, Result};

/// A harvested cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".into(),
            secure: false,
            http_only: false,
        }
    }
}

/// Host part of a URL.
pub fn host_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| BridgeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| BridgeError::InvalidUrl {
            url: url.to_string(),
            reason: "no host".into(),
        })
}

/// Host shown as the external-login title; the raw string when it does not
/// parse.
pub fn domain_from_url(url: &str) -> String {
    host_of(url).unwrap_or_else(|_| url.to_string())
}

/// `accounts.example.com` -> `.example.com`.
pub fn top_level_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let start = labels.len().saturating_sub(2);
    format!(".{}", labels[start..].join("."))
}

/// Split a cookie-store string into cookies tagged with `domain`.
///
/// Only the first `=` separates name from value.  Entries without `=` or
/// with an empty name are skipped.
pub fn parse_cookie_header(header: &str, domain: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(Cookie::new(name, value, domain))
        })
        .collect()
}

/// Keep only the latest cookie for each (domain, name).
pub fn dedupe_latest(cookies: Vec<Cookie>) -> Vec<Cookie> {
    let mut kept: Vec<Cookie> = Vec::with_capacity(cookies.len());
    for cookie in cookies {
        kept.retain(|c| !(c.domain == cookie.domain && c.name == cookie.name));
        kept.push(cookie);
    }
    kept
}

/// Cookies collected at the end of an external login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookieHarvest {
    pub cookies: Vec<Cookie>,
    /// Page the user ended on.
    #[serde(rename = "dashboard_url")]
    pub page_url: String,
    #[serde(skip)]
    pub captured_at: DateTime<Utc>,
}

impl CookieHarvest {
    pub fn new(cookies: Vec<Cookie>, page_url: impl Into<String>) -> Self {
        Self {
            cookies,
            page_url: page_url.into(),
            captured_at: Utc::now(),
        }
    }

    /// JSON argument for `onExternalLoginSuccess`.
    pub fn to_bridge_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
