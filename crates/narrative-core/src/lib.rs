// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Narrative journaling assistant.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types (profiles, conversations, emotional arcs, onboarding
//! questions) used throughout the Narrative workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::NarrativeError;
pub use types::{AdapterType, HealthStatus};

pub use traits::{PluginAdapter, ProviderAdapter, StorageAdapter};
