// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload of `citadelInterface.onSuccess`.

use serde::Deserialize;

use crate::error::{BridgeError, Result};
use crate::event::Employer;

/// Metadata attached to a successful link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessMetadata {
    pub task_id: String,
    pub employer: Option<Employer>,
}

/// A successful link.  The raw JSON is kept verbatim because the external
/// login flow forwards it, tagged, back into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessPayload {
    pub public_token: String,
    pub metadata: SuccessMetadata,
    pub raw_json: String,
}

#[derive(Deserialize)]
struct WireSuccess {
    public_token: Option<String>,
    metadata: Option<WireMetadata>,
}

#[derive(Deserialize)]
struct WireMetadata {
    task_id: Option<String>,
    #[serde(default)]
    employer: Option<Employer>,
}

impl SuccessPayload {
    pub fn from_json(raw: &str) -> Result<Self> {
        let wire: WireSuccess = serde_json::from_str(raw)?;
        let metadata = wire
            .metadata
            .ok_or(BridgeError::MissingField("metadata"))?;

        Ok(Self {
            public_token: wire
                .public_token
                .ok_or(BridgeError::MissingField("public_token"))?,
            metadata: SuccessMetadata {
                task_id: metadata
                    .task_id
                    .ok_or(BridgeError::MissingField("metadata.task_id"))?,
                employer: metadata.employer,
            },
            raw_json: raw.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_keeps_raw() {
        let raw = r#"{"public_token":"pt-1","metadata":{"task_id":"task-9","employer":{"name":"Acme"}},"extra":1}"#;
        let success = SuccessPayload::from_json(raw).unwrap();
        assert_eq!(success.public_token, "pt-1");
        assert_eq!(success.metadata.task_id, "task-9");
        assert_eq!(success.metadata.employer.unwrap().name.as_deref(), Some("Acme"));
        assert_eq!(success.raw_json, raw);
    }

    #[test]
    fn null_employer_name_is_absent() {
        let raw = r#"{"public_token":"pt","metadata":{"task_id":"t","employer":{"name":null}}}"#;
        let success = SuccessPayload::from_json(raw).unwrap();
        assert_eq!(success.metadata.employer, Some(Employer { name: None }));
    }

    #[test]
    fn employer_is_optional() {
        let raw = r#"{"public_token":"pt","metadata":{"task_id":"t"}}"#;
        assert!(SuccessPayload::from_json(raw).unwrap().metadata.employer.is_none());
    }

    #[test]
    fn missing_public_token_fails() {
        let raw = r#"{"metadata":{"task_id":"t"}}"#;
        assert!(matches!(
            SuccessPayload::from_json(raw),
            Err(BridgeError::MissingField("public_token"))
        ));
    }
}
