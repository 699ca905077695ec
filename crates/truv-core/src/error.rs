// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Truv bridge.

use thiserror::Error;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Event decoding --
    #[error("malformed bridge JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unknown error code: {0}")]
    UnknownErrorCode(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unknown bridge call {interface}.{method}")]
    UnknownCall { interface: String, method: String },

    // -- Network --
    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// DNS, connect, or timeout failure: the host was never reached.
    #[error("network unreachable: {0}")]
    Connectivity(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    // -- Page scripting --
    #[error("script evaluation failed: {0}")]
    Script(String),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("no async runtime available to drive the bridge")]
    NoRuntime,

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure is a network reachability problem (DNS, connect,
    /// timeout) rather than a protocol or content problem.
    pub fn is_connectivity(&self) -> bool {
        match self {
            BridgeError::Connectivity(_) => true,
            BridgeError::Io(io_err) => matches!(
                io_err.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
            ),
            _ => false,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_host_counts_as_connectivity() {
        assert!(BridgeError::Connectivity("operation timed out after 30s".into()).is_connectivity());
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(BridgeError::from(refused).is_connectivity());
    }

    #[test]
    fn wording_does_not_make_connectivity() {
        assert!(!BridgeError::Http("connection closed before message completed".into()).is_connectivity());
        assert!(!BridgeError::Http("status 500".into()).is_connectivity());
        assert!(!BridgeError::UnknownEventType("NOPE".into()).is_connectivity());
    }
}
