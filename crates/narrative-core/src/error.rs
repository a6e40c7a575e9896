// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Narrative journaling assistant.

use thiserror::Error;

/// Error shared by every adapter trait and the turn pipeline.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// Settings that cannot be used, such as an unknown default persona.
    #[error("configuration error: {0}")]
    Config(String),

    /// A request was missing required fields or carried an invalid value.
    #[error("validation error: {0}")]
    Validation(String),

    /// The onboarding step key does not map to a known step.
    #[error("invalid onboarding step: {step}")]
    InvalidStep { step: String },

    /// The completion service failed, timed out, or returned an unusable reply.
    ///
    /// A turn that fails with this error commits nothing.
    #[error("generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Crystallization input was below the minimum length.
    #[error("entry too short: expected at least {min_len} characters")]
    TooShort { min_len: usize },

    /// SQLite failed, or a stored row did not decode.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The completion API answered with an error or an unreadable body.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A completion call exceeded the turn timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    #[error("internal error: {0}")]
    Internal(String),
}

impl NarrativeError {
    /// Returns true for errors caused by the caller's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            NarrativeError::Validation(_)
                | NarrativeError::InvalidStep { .. }
                | NarrativeError::TooShort { .. }
        )
    }

    /// Wraps any error as a [`NarrativeError::Generation`], keeping generation errors as-is.
    pub fn into_generation(self) -> NarrativeError {
        match self {
            NarrativeError::Generation { .. } => self,
            other => NarrativeError::Generation {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
