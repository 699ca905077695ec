// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Texts for the inline error views the bridge can show.
//
// Nothing in the bridge is fatal.  Failures end up either in the logs or in
// one of these views; this module decides which text goes with which.

use crate::error::BridgeError;
use crate::types::NavigationErrorKind;

/// How the error should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network trouble; the view offers a retry button.
    Transient,
    /// Nothing the user can do; only logged.
    Silent,
}

/// A user-facing error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Heading.
    pub message: String,
    /// Body text.
    pub suggestion: String,
    /// Whether the view shows a retry button.
    pub retriable: bool,
    pub severity: Severity,
}

fn connection_error() -> HumanError {
    HumanError {
        message: "Connection error".into(),
        suggestion: "Please check your internet connection and try again.".into(),
        retriable: true,
        severity: Severity::Transient,
    }
}

fn silent(detail: String) -> HumanError {
    HumanError {
        message: "Something went wrong".into(),
        suggestion: detail,
        retriable: false,
        severity: Severity::Silent,
    }
}

/// Text for a failed navigation.
pub fn humanize_navigation(kind: NavigationErrorKind) -> HumanError {
    if kind.is_connectivity() {
        connection_error()
    } else {
        silent(format!("navigation failed ({kind:?})"))
    }
}

/// Text for a bridge error surfaced during the external login.
///
/// Login-check failures always block the sheet with the connection view, since the
/// only thing the user can do about them is retry.  Only an unreachable host
/// asks the user to check their connection.
pub fn humanize_error(err: &BridgeError) -> HumanError {
    if err.is_connectivity() {
        return connection_error();
    }
    match err {
        BridgeError::Http(_) | BridgeError::Script(_) | BridgeError::Io(_) => HumanError {
            suggestion: "The sign-in page did not respond as expected. Please try again.".into(),
            ..connection_error()
        },
        BridgeError::InvalidUrl { url, .. } => silent(format!("invalid address: {url}")),
        other => silent(other.to_string()),
    }
}
