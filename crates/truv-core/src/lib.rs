// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Truv bridge — core event types and error definitions shared across all crates.

pub mod channel;
pub mod config;
pub mod cookie;
pub mod error;
pub mod event;
pub mod human_errors;
pub mod script;
pub mod success;
pub mod types;

pub use config::BridgeConfig;
pub use error::BridgeError;
pub use event::{EventPayload, EventType, ExternalLoginConfig, LoginDetection, Payload, TruvError};
pub use success::SuccessPayload;
pub use types::*;
