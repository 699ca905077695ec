// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Native-to-page calls, rendered as script snippets for evaluation in the
// primary surface.

use serde_json::Value;

use crate::config::SdkInfo;
use crate::error::{BridgeError, Result};

/// A call into the hosted page's `window.bridge` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeScript {
    /// Hardware back button.
    BackPress,
    /// The user closed the external-login surface.
    ExternalLoginCancel,
    /// External login finished; the argument is a JSON document.
    ExternalLoginSuccess(String),
}

impl BridgeScript {
    pub fn render(&self) -> String {
        match self {
            Self::BackPress => "window.bridge?.back();".into(),
            Self::ExternalLoginCancel => "window.bridge?.onExternalLoginCancel();".into(),
            Self::ExternalLoginSuccess(data) => {
                format!("window.bridge?.onExternalLoginSuccess({data});")
            }
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackPress => "back",
            Self::ExternalLoginCancel => "onExternalLoginCancel",
            Self::ExternalLoginSuccess(_) => "onExternalLoginSuccess",
        }
    }
}

/// Add the SDK `tags` array to a success payload before relaying it.
///
/// The payload must be a JSON object; an existing `tags` key is replaced.
pub fn tag_payload(raw_json: &str, sdk: &SdkInfo) -> Result<String> {
    let mut value: Value = serde_json::from_str(raw_json)?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| BridgeError::Script("success payload is not a JSON object".into()))?;
    object.insert("tags".into(), Value::from(sdk.tags()));
    Ok(value.to_string())
}
