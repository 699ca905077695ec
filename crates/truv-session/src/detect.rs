// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOM checks that detect a completed third-party login.

use serde_json::Value;
use truv_core::channel::{LOGGED_IN_EVENT, PAGE_MESSAGE_INTERFACE, is_logged_in_message};

/// Result of one login-check evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVerdict {
    LoggedIn,
    NotYet,
}

impl LoginVerdict {
    /// Interpret the JSON-encoded evaluation result.
    ///
    /// `true`, or a string holding the logged-in sentinel, means done.
    /// `false`, `null`, and anything unparseable mean not yet.
    pub fn from_evaluation(result: &str) -> Self {
        match serde_json::from_str::<Value>(result.trim()) {
            Ok(Value::Bool(true)) => Self::LoggedIn,
            Ok(Value::String(inner)) if is_logged_in_message(&inner) => Self::LoggedIn,
            _ => Self::NotYet,
        }
    }
}

/// Script that checks whether `selector` matches a visible element.
///
/// Selectors starting with `/` and containing a second `/` are treated as
/// XPath, everything else as CSS.  On a match the script posts the
/// logged-in sentinel to the page-message channel and evaluates to `true`.
pub fn selector_check_script(selector: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    let literal = Value::from(selector).to_string();
    format!(
        r#"(function() {{
    try {{
        const isDisplayed = (element) => {{
            const style = window.getComputedStyle(element);
            const rect = element.getBoundingClientRect();
            return !!style && style.visibility !== 'hidden'
                && !!(rect.top || rect.bottom || rect.width || rect.height);
        }};
        const selector = {literal};
        const isXPath = /^\/[\s\S]*\//.test(selector);
        const element = isXPath
            ? document.evaluate(selector, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue
            : document.querySelector(selector);
        if (element && isDisplayed(element)) {{
            const channel = window.{PAGE_MESSAGE_INTERFACE};
            if (channel) {{
                channel.postMessage(JSON.stringify({{ "event": "{LOGGED_IN_EVENT}" }}));
            }}
            return true;
        }}
        return false;
    }} catch (error) {{
        console.error('login check failed', error);
        return false;
    }}
}})();"#
    )
}
