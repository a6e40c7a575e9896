// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the profile and conversation documents.

pub mod conversations;
pub mod profiles;

use narrative_core::NarrativeError;

fn encode<T: serde::Serialize>(value: &T) -> Result<String, NarrativeError> {
    serde_json::to_string(value).map_err(|e| NarrativeError::Storage {
        source: Box::new(e),
    })
}

fn decode<T: serde::de::DeserializeOwned>(document: &str) -> Result<T, NarrativeError> {
    serde_json::from_str(document).map_err(|e| NarrativeError::Storage {
        source: Box::new(e),
    })
}
