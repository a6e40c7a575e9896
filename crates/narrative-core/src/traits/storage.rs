// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the profile and conversation document store.

use async_trait::async_trait;

use crate::error::NarrativeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Conversation, DetectedPatterns, UserProfile};

/// Adapter for the document store holding profiles and conversations.
///
/// Both collections are keyed by `user_id`. The contract is read-modify-write:
/// callers that mutate a document must serialize access per user.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), NarrativeError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), NarrativeError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, NarrativeError>;

    /// Inserts or replaces the profile document for `profile.user_id`.
    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), NarrativeError>;

    async fn get_conversation(
        &self,
        user_id: &str,
    ) -> Result<Option<Conversation>, NarrativeError>;

    /// Commits a completed chat turn.
    ///
    /// Writes the conversation document and merges `patterns` into the
    /// owner's profile in a single transaction: either both land or neither.
    async fn commit_turn(
        &self,
        conversation: &Conversation,
        patterns: &DetectedPatterns,
    ) -> Result<(), NarrativeError>;
}
