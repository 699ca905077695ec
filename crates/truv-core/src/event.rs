// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event schema posted by the hosted flow through `citadelInterface.onEvent`.
//
// The page sends a JSON object with an `event_type` tag and an optional
// `payload`.  Decoding goes through private wire structs that mirror the JSON
// one-for-one, then a single fallible conversion produces the validated
// domain types below.  Unknown `event_type` or error `code` strings fail the
// whole decode; there is no catch-all variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{BridgeError, Result};

/// The fixed vocabulary of event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Load,
    Open,
    ScreenView,
    EmployerSelected,
    LinkCreated,
    LoginComplete,
    Success,
    Error,
    UnsupportedBrowser,
    StartExternalLogin,
    OauthOpened,
    Close,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        Self::Load,
        Self::Open,
        Self::ScreenView,
        Self::EmployerSelected,
        Self::LinkCreated,
        Self::LoginComplete,
        Self::Success,
        Self::Error,
        Self::UnsupportedBrowser,
        Self::StartExternalLogin,
        Self::OauthOpened,
        Self::Close,
    ];

    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "LOAD",
            Self::Open => "OPEN",
            Self::ScreenView => "SCREEN_VIEW",
            Self::EmployerSelected => "EMPLOYER_SELECTED",
            Self::LinkCreated => "LINK_CREATED",
            Self::LoginComplete => "LOGIN_COMPLETE",
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::UnsupportedBrowser => "UNSUPPORTED_BROWSER",
            Self::StartExternalLogin => "START_EXTERNAL_LOGIN",
            Self::OauthOpened => "OAUTH_OPENED",
            Self::Close => "CLOSE",
        }
    }

    /// Events whose handling depends on a payload sub-object.  The page is
    /// trusted to send it; a missing one is only logged.
    pub fn requires_payload(&self) -> bool {
        matches!(
            self,
            Self::Error | Self::StartExternalLogin | Self::OauthOpened
        )
    }

    /// Events routed to a dedicated handler before generic dispatch.
    pub fn is_intercepted(&self) -> bool {
        matches!(self, Self::StartExternalLogin | Self::OauthOpened)
    }
}

impl FromStr for EventType {
    type Err = BridgeError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "LOAD" => Ok(Self::Load),
            "OPEN" => Ok(Self::Open),
            "SCREEN_VIEW" => Ok(Self::ScreenView),
            "EMPLOYER_SELECTED" => Ok(Self::EmployerSelected),
            "LINK_CREATED" => Ok(Self::LinkCreated),
            "LOGIN_COMPLETE" => Ok(Self::LoginComplete),
            "SUCCESS" => Ok(Self::Success),
            "ERROR" => Ok(Self::Error),
            "UNSUPPORTED_BROWSER" => Ok(Self::UnsupportedBrowser),
            "START_EXTERNAL_LOGIN" => Ok(Self::StartExternalLogin),
            "OAUTH_OPENED" => Ok(Self::OauthOpened),
            "CLOSE" => Ok(Self::Close),
            other => Err(BridgeError::UnknownEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error codes reported by the hosted flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    LinkError,
    Unavailable,
    MfaError,
    LoginError,
    Error,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkError => "LINK_ERROR",
            Self::Unavailable => "UNAVAILABLE",
            Self::MfaError => "MFA_ERROR",
            Self::LoginError => "LOGIN_ERROR",
            Self::Error => "ERROR",
        }
    }
}

impl FromStr for ErrorCode {
    type Err = BridgeError;

    fn from_str(code: &str) -> Result<Self> {
        match code {
            "LINK_ERROR" => Ok(Self::LinkError),
            "UNAVAILABLE" => Ok(Self::Unavailable),
            "MFA_ERROR" => Ok(Self::MfaError),
            "LOGIN_ERROR" => Ok(Self::LoginError),
            "ERROR" => Ok(Self::Error),
            other => Err(BridgeError::UnknownErrorCode(other.to_string())),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error object attached to ERROR events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruvError {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: ErrorCode,
    pub message: String,
}

/// Employer chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `is_logged_in` block of a START_EXTERNAL_LOGIN payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

/// Headers the callback POST must carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackHeaders {
    #[serde(
        rename = "Content-Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<String>,
    #[serde(
        rename = "X-Access-Token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub x_access_token: Option<String>,
}

/// `script` block: where to fetch the detection script and where to send the
/// harvested result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_headers: Option<CallbackHeaders>,
}

/// How the external-login session detects that the user has signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginDetection {
    /// CSS selector, or XPath when it starts with `/`.
    Selector(String),
    /// A script fetched from this URL and evaluated in the page.
    RemoteScript(String),
}

/// Everything needed to run one external-login sub-session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLoginConfig {
    pub url: String,
    pub detection: LoginDetection,
    pub script: Option<CallbackScript>,
}

impl ExternalLoginConfig {
    /// Build a config from the raw payload fields.
    ///
    /// Requires a non-empty target URL and at least one non-empty anchor.  A
    /// remote script URL wins over a selector when both are present.
    pub fn derive(
        url: Option<&str>,
        check: Option<&LoginCheck>,
        script: Option<&CallbackScript>,
    ) -> Option<Self> {
        let url = url.unwrap_or_default();
        if url.is_empty() {
            return None;
        }

        let script_url = script.and_then(|s| s.url.as_deref()).unwrap_or_default();
        let selector = check
            .and_then(|c| c.selector.as_deref())
            .unwrap_or_default();

        let detection = if !script_url.is_empty() {
            LoginDetection::RemoteScript(script_url.to_string())
        } else if !selector.is_empty() {
            LoginDetection::Selector(selector.to_string())
        } else {
            return None;
        };

        Some(Self {
            url: url.to_string(),
            detection,
            script: script.cloned(),
        })
    }

    pub fn selector(&self) -> Option<&str> {
        match &self.detection {
            LoginDetection::Selector(selector) => Some(selector),
            LoginDetection::RemoteScript(_) => None,
        }
    }

    pub fn script_url(&self) -> Option<&str> {
        match &self.detection {
            LoginDetection::RemoteScript(url) => Some(url),
            LoginDetection::Selector(_) => None,
        }
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.script
            .as_ref()
            .and_then(|s| s.callback_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn callback_headers(&self) -> CallbackHeaders {
        self.script
            .as_ref()
            .and_then(|s| s.callback_headers.clone())
            .unwrap_or_default()
    }
}

/// Optional fields carried by an event.  No field is guaranteed for any
/// event type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<Employer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TruvError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_login_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_logged_in: Option<LoginCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<CallbackScript>,
    /// Derived from `url`, `is_logged_in` and `script`; never on the wire.
    #[serde(skip)]
    pub external_login_config: Option<ExternalLoginConfig>,
}

/// A decoded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl EventPayload {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            payload: None,
        }
    }

    /// Decode one event posted by the page.
    pub fn from_json(raw: &str) -> Result<Self> {
        let wire: WireEvent = serde_json::from_str(raw)?;
        wire.try_into()
    }

    /// Re-encode in the wire shape.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn external_login_config(&self) -> Option<&ExternalLoginConfig> {
        self.payload
            .as_ref()
            .and_then(|p| p.external_login_config.as_ref())
    }

    pub fn url(&self) -> Option<&str> {
        self.payload
            .as_ref()
            .and_then(|p| p.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

// -- Wire format -------------------------------------------------------------

#[derive(Deserialize)]
struct WireEvent {
    event_type: Option<String>,
    #[serde(default)]
    payload: Option<WirePayload>,
    #[serde(default)]
    error: Option<WireError>,
}

#[derive(Deserialize)]
struct WirePayload {
    #[serde(default)]
    bridge_token: Option<String>,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    view_name: Option<String>,
    #[serde(default)]
    employer: Option<Employer>,
    #[serde(default)]
    public_token: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
    #[serde(default)]
    error: Option<WireError>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    external_login_type: Option<String>,
    #[serde(default)]
    is_logged_in: Option<LoginCheck>,
    #[serde(default)]
    script: Option<CallbackScript>,
}

#[derive(Deserialize)]
struct WireError {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl TryFrom<WireError> for TruvError {
    type Error = BridgeError;

    fn try_from(wire: WireError) -> Result<Self> {
        let code = wire.code.ok_or(BridgeError::MissingField("error.code"))?;
        Ok(TruvError {
            kind: wire.kind.unwrap_or_default(),
            code: code.parse()?,
            message: wire.message.unwrap_or_default(),
        })
    }
}

impl TryFrom<WirePayload> for Payload {
    type Error = BridgeError;

    fn try_from(wire: WirePayload) -> Result<Self> {
        let error = wire.error.map(TruvError::try_from).transpose()?;
        let external_login_config = ExternalLoginConfig::derive(
            wire.url.as_deref(),
            wire.is_logged_in.as_ref(),
            wire.script.as_ref(),
        );

        Ok(Payload {
            bridge_token: wire.bridge_token,
            product_type: wire.product_type,
            view_name: wire.view_name,
            employer: wire.employer,
            public_token: wire.public_token,
            task_id: wire.task_id,
            provider_id: wire.provider_id,
            error,
            url: wire.url,
            external_login_type: wire.external_login_type,
            is_logged_in: wire.is_logged_in,
            script: wire.script,
            external_login_config,
        })
    }
}

impl TryFrom<WireEvent> for EventPayload {
    type Error = BridgeError;

    fn try_from(wire: WireEvent) -> Result<Self> {
        let event_type: EventType = wire
            .event_type
            .ok_or(BridgeError::MissingField("event_type"))?
            .parse()?;

        let mut payload = wire.payload.map(Payload::try_from).transpose()?;

        // Older pages put `error` next to `payload` instead of inside it.
        if let Some(top_level) = wire.error {
            let error = TruvError::try_from(top_level)?;
            let slot = payload.get_or_insert_with(Payload::default);
            if slot.error.is_none() {
                slot.error = Some(error);
            }
        }

        Ok(EventPayload {
            event_type,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_round_trips_through_the_table() {
        for event_type in EventType::ALL {
            assert_eq!(event_type.as_str().parse::<EventType>().ok(), Some(event_type));
        }
    }

    #[test]
    fn unknown_event_type_fails() {
        let err = EventPayload::from_json(r#"{"event_type":"TELEPORT"}"#).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownEventType(tag) if tag == "TELEPORT"));
    }

    #[test]
    fn missing_event_type_fails() {
        let err = EventPayload::from_json(r#"{"payload":{"view_name":"x"}}"#).unwrap_err();
        assert!(matches!(err, BridgeError::MissingField("event_type")));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(
            EventPayload::from_json("{not json").unwrap_err(),
            BridgeError::Json(_)
        ));
    }

    #[test]
    fn unknown_error_code_fails_whole_event() {
        let raw = r#"{"event_type":"ERROR","payload":{"view_name":"login","error":{"type":"x","code":"BOOM","message":"m"}}}"#;
        let err = EventPayload::from_json(raw).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownErrorCode(code) if code == "BOOM"));
    }

    #[test]
    fn error_payload_decodes() {
        let raw = r#"{"event_type":"ERROR","payload":{"error":{"type":"LINK_ERROR","code":"MFA_ERROR","message":"Wrong code"}}}"#;
        let event = EventPayload::from_json(raw).unwrap();
        let error = event.payload.unwrap().error.unwrap();
        assert_eq!(error.code, ErrorCode::MfaError);
        assert_eq!(error.kind, "LINK_ERROR");
        assert_eq!(error.message, "Wrong code");
    }

    #[test]
    fn top_level_error_is_folded_into_payload() {
        let raw = r#"{"event_type":"ERROR","error":{"type":"t","code":"UNAVAILABLE","message":"down"}}"#;
        let event = EventPayload::from_json(raw).unwrap();
        let payload = event.payload.unwrap();
        assert_eq!(payload.error.unwrap().code, ErrorCode::Unavailable);
    }

    #[test]
    fn selector_config_is_derived() {
        let raw = r##"{"event_type":"START_EXTERNAL_LOGIN","payload":{"url":"https://x.test","is_logged_in":{"selector":"#done"}}}"##;
        let event = EventPayload::from_json(raw).unwrap();
        let config = event.external_login_config().unwrap();
        assert_eq!(config.url, "https://x.test");
        assert_eq!(config.selector(), Some("#done"));
    }

    #[test]
    fn no_anchor_means_no_config() {
        let raw = r#"{"event_type":"START_EXTERNAL_LOGIN","payload":{"url":"https://x.test"}}"#;
        let event = EventPayload::from_json(raw).unwrap();
        assert!(event.external_login_config().is_none());
    }

    #[test]
    fn empty_url_means_no_config() {
        let raw = r##"{"event_type":"START_EXTERNAL_LOGIN","payload":{"url":"","is_logged_in":{"selector":"#done"}}}"##;
        let event = EventPayload::from_json(raw).unwrap();
        assert!(event.external_login_config().is_none());
    }

    #[test]
    fn remote_script_wins_over_selector() {
        let raw = r##"{"event_type":"START_EXTERNAL_LOGIN","payload":{
            "url":"https://portal.example.com/login",
            "is_logged_in":{"selector":"#done"},
            "script":{"url":"https://cdn.example.com/detect.js","callback_url":"https://api.example.com/cb",
                      "callback_headers":{"Content-Type":"application/json","X-Access-Token":"tok"}}}}"##;
        let event = EventPayload::from_json(raw).unwrap();
        let config = event.external_login_config().unwrap();
        assert_eq!(config.script_url(), Some("https://cdn.example.com/detect.js"));
        assert_eq!(config.selector(), None);
        assert_eq!(config.callback_url(), Some("https://api.example.com/cb"));
        assert_eq!(config.callback_headers().x_access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn reserialize_keeps_present_fields() {
        let raw = r##"{"event_type":"EMPLOYER_SELECTED","payload":{"bridge_token":"bt","product_type":"income","view_name":"search","employer":{"name":"Acme"},"task_id":"t1","provider_id":"adp","is_logged_in":{"selector":"#x"}}}"##;
        let event = EventPayload::from_json(raw).unwrap();
        let again = EventPayload::from_json(&event.to_json().unwrap()).unwrap();
        assert_eq!(again, event);

        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["payload"]["employer"]["name"], "Acme");
        assert!(value["payload"].get("public_token").is_none());
    }

    #[test]
    fn empty_string_is_kept_distinct_from_absent() {
        let raw = r#"{"event_type":"SCREEN_VIEW","payload":{"view_name":""}}"#;
        let payload = EventPayload::from_json(raw).unwrap().payload.unwrap();
        assert_eq!(payload.view_name.as_deref(), Some(""));
        assert_eq!(payload.task_id, None);
    }

    #[test]
    fn null_employer_name_does_not_drop_event() {
        let raw = r#"{"event_type":"EMPLOYER_SELECTED","payload":{"employer":{"name":null},"task_id":"t1"}}"#;
        let payload = EventPayload::from_json(raw).unwrap().payload.unwrap();
        assert_eq!(payload.employer, Some(Employer { name: None }));
        assert_eq!(payload.task_id.as_deref(), Some("t1"));
    }
}
