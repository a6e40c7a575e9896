// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`StorageAdapter`] over a single SQLite file.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use narrative_config::model::StorageConfig;
use narrative_core::types::{Conversation, DetectedPatterns, UserProfile};
use narrative_core::{AdapterType, HealthStatus, NarrativeError, PluginAdapter, StorageAdapter};

use crate::database::{Database, map_tr_err};
use crate::queries::{conversations, profiles};

/// Profiles and conversations in SQLite.
///
/// Nothing touches disk until [`StorageAdapter::initialize`]; every other
/// call fails with a storage error before that.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn opened(&self) -> Result<&Database, NarrativeError> {
        self.db.get().ok_or_else(|| NarrativeError::Storage {
            source: "database is not open; initialize() has not run".into(),
        })
    }

    /// Runs `sql` on the writer thread, discarding results.
    async fn exec(db: &Database, sql: &'static str) -> Result<(), NarrativeError> {
        db.connection()
            .call(move |conn| conn.execute_batch(sql))
            .await
            .map_err(map_tr_err)
    }

    /// Folds the WAL back into the main file so a copied `.db` is complete.
    async fn flush_wal(&self, db: &Database) -> Result<(), NarrativeError> {
        if self.config.wal_mode {
            Self::exec(db, "PRAGMA wal_checkpoint(TRUNCATE);").await?;
            debug!(path = %self.config.database_path, "WAL truncated");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, NarrativeError> {
        match self.db.get() {
            None => Ok(HealthStatus::Unhealthy("database is not open".into())),
            Some(db) => Self::exec(db, "SELECT 1;")
                .await
                .map(|()| HealthStatus::Healthy),
        }
    }

    async fn shutdown(&self) -> Result<(), NarrativeError> {
        match self.db.get() {
            Some(db) => self.flush_wal(db).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), NarrativeError> {
        if self.db.initialized() {
            return Err(NarrativeError::Storage {
                source: "database is already open".into(),
            });
        }
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| NarrativeError::Storage {
            source: "database is already open".into(),
        })?;
        info!(path = %self.config.database_path, "journal database ready");
        Ok(())
    }

    async fn close(&self) -> Result<(), NarrativeError> {
        self.flush_wal(self.opened()?).await
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, NarrativeError> {
        profiles::get_profile(self.opened()?, user_id).await
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<(), NarrativeError> {
        profiles::upsert_profile(self.opened()?, profile).await
    }

    async fn get_conversation(
        &self,
        user_id: &str,
    ) -> Result<Option<Conversation>, NarrativeError> {
        conversations::get_conversation(self.opened()?, user_id).await
    }

    async fn commit_turn(
        &self,
        conversation: &Conversation,
        patterns: &DetectedPatterns,
    ) -> Result<(), NarrativeError> {
        conversations::commit_turn(self.opened()?, conversation, patterns).await
    }
}
