// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A journaling engine wired to throwaway storage.
//!
//! `TestHarness` assembles a complete conversation engine with a mock
//! provider and a temp SQLite database.

use std::sync::Arc;
use std::time::Duration;

use narrative_config::model::StorageConfig;
use narrative_core::{NarrativeError, ProviderAdapter, StorageAdapter};
use narrative_engine::{
    ConversationEngine, EngineSettings, OnboardingFlow, RawAnswer, TurnOutcome,
};
use narrative_persona::PersonaCatalog;
use narrative_persona::catalog::GENTLE_GUIDE;
use narrative_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Configures a [`TestHarness`] before its database is created.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    settings: EngineSettings,
    default_persona: String,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            settings: EngineSettings::default(),
            default_persona: GENTLE_GUIDE.to_string(),
        }
    }

    /// Replies the mock provider gives, in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.settings.turn_timeout = timeout;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_default_persona(mut self, key: impl Into<String>) -> Self {
        self.default_persona = key.into();
        self
    }

    /// Opens a fresh SQLite file in a temp dir and builds the engine over it.
    pub async fn build(self) -> Result<TestHarness, NarrativeError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| NarrativeError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("journal.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        let storage: Arc<dyn StorageAdapter> = Arc::new(storage);

        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));
        let engine = Arc::new(ConversationEngine::new(
            Arc::clone(&storage),
            Arc::clone(&mock_provider) as Arc<dyn ProviderAdapter>,
            PersonaCatalog::builtin(&self.default_persona)?,
            OnboardingFlow::builtin(),
            self.settings,
        ));

        Ok(TestHarness {
            mock_provider,
            storage,
            engine,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock provider and temp storage.
pub struct TestHarness {
    pub mock_provider: Arc<MockProvider>,
    /// Removed together with the temp dir when the harness drops.
    pub storage: Arc<dyn StorageAdapter>,
    pub engine: Arc<ConversationEngine>,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default settings.
    pub async fn new() -> Result<Self, NarrativeError> {
        Self::builder().build().await
    }

    /// Completes every onboarding step for `user_id` with fixed answers.
    pub async fn onboard(&self, user_id: &str, age_range: &str) -> Result<(), NarrativeError> {
        let answers = [
            RawAnswer::Text(age_range.to_string()),
            RawAnswer::Text("casual".to_string()),
            RawAnswer::Text("music, hiking".to_string()),
            RawAnswer::Text("story-focused".to_string()),
        ];
        for (i, answer) in answers.into_iter().enumerate() {
            self.engine
                .submit_onboarding_answer(user_id, i as u32 + 1, answer)
                .await?;
        }
        Ok(())
    }

    /// Runs one turn with the default persona.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<TurnOutcome, NarrativeError> {
        self.engine.handle_turn(user_id, message, None).await
    }

    /// Number of stored messages for `user_id` (0 when no conversation exists).
    pub async fn message_count(&self, user_id: &str) -> Result<usize, NarrativeError> {
        Ok(self
            .storage
            .get_conversation(user_id)
            .await?
            .map_or(0, |c| c.messages.len()))
    }
}
