// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recorded page-to-native calls, one JSON object per line.

use std::path::Path;

use serde::Deserialize;
use truv_core::error::{BridgeError, Result};

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptEntry {
    pub interface: String,
    pub method: String,
    #[serde(default)]
    pub arg: Option<String>,
}

/// Parse a transcript.  Blank lines and lines starting with `#` are skipped.
pub fn parse(text: &str) -> Result<Vec<TranscriptEntry>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| BridgeError::Bridge(format!("transcript line {}: {e}", index + 1)))
        })
        .collect()
}

pub fn load(path: &Path) -> Result<Vec<TranscriptEntry>> {
    parse(&std::fs::read_to_string(path)?)
}
