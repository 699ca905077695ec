// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inbound page-to-native calls.
//
// The page reaches native code through named script interfaces.  Platform
// glue hands every call over as (interface, method, argument) strings and
// `InboundCall::decode` maps it to a fixed native entry point.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// Interface carrying the hosted flow's lifecycle calls.
pub const CITADEL_INTERFACE: &str = "citadelInterface";

/// Interface the external-login script uses to relay its result.
pub const CALLBACK_INTERFACE: &str = "callbackInterface";

/// Interface login-detection scripts post their sentinel message to.
pub const PAGE_MESSAGE_INTERFACE: &str = "ReactNativeWebView";

/// Sentinel `event` value posted by a detection script once the user is signed in.
pub const LOGGED_IN_EVENT: &str = "logged_in";

/// A decoded page-to-native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCall {
    /// `citadelInterface.onSuccess(payload)`
    Success(String),
    /// `citadelInterface.onEvent(event)`
    Event(String),
    /// `citadelInterface.onClose()`
    Close,
    /// `citadelInterface.onLoad()`
    Load,
    /// `citadelInterface.onError()`
    Error,
    /// `callbackInterface.call(response)`
    Callback(String),
    /// `ReactNativeWebView.postMessage(message)`
    PageMessage(String),
}

impl InboundCall {
    pub fn decode(interface: &str, method: &str, arg: Option<&str>) -> Result<Self> {
        let required = |field: &'static str| {
            arg.map(str::to_string)
                .ok_or(BridgeError::MissingField(field))
        };

        match (interface, method) {
            (CITADEL_INTERFACE, "onSuccess") => Ok(Self::Success(required("payload")?)),
            (CITADEL_INTERFACE, "onEvent") => Ok(Self::Event(required("event")?)),
            (CITADEL_INTERFACE, "onClose") => Ok(Self::Close),
            (CITADEL_INTERFACE, "onLoad") => Ok(Self::Load),
            (CITADEL_INTERFACE, "onError") => Ok(Self::Error),
            (CALLBACK_INTERFACE, "call") => Ok(Self::Callback(required("response")?)),
            (PAGE_MESSAGE_INTERFACE, "postMessage") => {
                Ok(Self::PageMessage(required("message")?))
            }
            _ => Err(BridgeError::UnknownCall {
                interface: interface.to_string(),
                method: method.to_string(),
            }),
        }
    }
}

#[derive(Deserialize)]
struct PageMessage {
    event: Option<String>,
}

/// Whether a page message is the `{"event":"logged_in"}` sentinel.
pub fn is_logged_in_message(message: &str) -> bool {
    serde_json::from_str::<PageMessage>(message)
        .ok()
        .and_then(|m| m.event)
        .is_some_and(|event| event == LOGGED_IN_EVENT)
}

/// Device details in a middleware response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MiddlewarePayload {
    #[serde(rename = "adpDeviceFingerprint", default)]
    pub adp_device_fingerprint: Option<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub session: Option<String>,
}

/// Body of `callbackInterface.call`.  Decoded for logging only; the raw
/// string is what gets relayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MiddlewareResponse {
    #[serde(default)]
    pub installation_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub payload: Option<MiddlewarePayload>,
}

impl MiddlewareResponse {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
