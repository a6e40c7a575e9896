// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `narrative serve` command implementation.
//!
//! Wires SQLite storage, the Anthropic provider, the persona catalog and the
//! conversation engine behind the HTTP API, then serves until SIGINT/SIGTERM.

use std::sync::Arc;

use narrative_anthropic::AnthropicProvider;
use narrative_config::model::{CrystallizerMode, NarrativeConfig};
use narrative_core::error::NarrativeError;
use narrative_core::{PluginAdapter, ProviderAdapter, StorageAdapter};
use narrative_engine::shutdown;
use narrative_engine::{
    ConversationEngine, Crystallizer, EngineSettings, OnboardingFlow, ProviderCrystallizer,
    RuleBasedCrystallizer,
};
use narrative_gateway::{AppState, ServerConfig, start_server};
use narrative_persona::PersonaCatalog;
use narrative_storage::SqliteStorage;
use tracing::{error, info};

/// Runs the `narrative serve` command.
pub async fn run_serve(config: NarrativeConfig) -> Result<(), NarrativeError> {
    init_tracing(&config.app.log_level);

    info!(name = %config.app.name, "starting narrative serve");

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    info!(path = %config.storage.database_path, "storage initialized");

    let provider = match AnthropicProvider::new(&config) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!(error = %e, "failed to initialize completion provider");
            storage.close().await?;
            return Err(e);
        }
    };

    let state = build_app_state(&config, storage.clone(), provider.clone())?;
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let cancel = shutdown::install_signal_handler();
    let served = start_server(&server_config, state, cancel).await;

    info!("shutting down");
    if let Err(e) = provider.shutdown().await {
        error!(error = %e, "provider shutdown failed");
    }
    storage.close().await?;
    served
}

/// Builds the shared handler state from already-initialized adapters.
pub fn build_app_state(
    config: &NarrativeConfig,
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
) -> Result<AppState, NarrativeError> {
    let personas = PersonaCatalog::builtin(&config.engine.default_persona)?;
    info!(
        personas = %personas.keys().collect::<Vec<_>>().join(", "),
        default = %config.engine.default_persona,
        "available personas"
    );

    let crystallizer: Arc<dyn Crystallizer> = match config.crystallizer.mode {
        CrystallizerMode::Rules => {
            Arc::new(RuleBasedCrystallizer::new(config.crystallizer.min_length))
        }
        CrystallizerMode::Provider => Arc::new(ProviderCrystallizer::new(
            provider.clone(),
            config.anthropic.default_model.clone(),
            config.anthropic.max_tokens,
            config.crystallizer.min_length,
        )),
    };
    info!(mode = ?config.crystallizer.mode, "crystallizer selected");

    let engine = ConversationEngine::new(
        storage,
        provider,
        personas,
        OnboardingFlow::builtin(),
        EngineSettings::from_config(config),
    );

    Ok(AppState {
        engine: Arc::new(engine),
        crystallizer,
        context_turns: config.crystallizer.context_turns,
    })
}

/// Initializes the tracing subscriber; `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("narrative={log_level},warn")));

    // A second init (tests, embedded use) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrative_test_utils::MockProvider;
    use tracing_test::traced_test;

    async fn temp_storage(dir: &tempfile::TempDir) -> Arc<SqliteStorage> {
        let mut config = NarrativeConfig::default();
        config.storage.database_path = dir.path().join("n.db").display().to_string();
        let storage = Arc::new(SqliteStorage::new(config.storage));
        storage.initialize().await.unwrap();
        storage
    }

    #[tokio::test]
    #[traced_test]
    async fn app_state_logs_available_personas() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;
        let config = NarrativeConfig::default();

        let state =
            build_app_state(&config, storage, Arc::new(MockProvider::new())).unwrap();

        assert_eq!(state.context_turns, 10);
        assert!(state.engine.personas().get("fellow-traveler").is_some());
        assert!(logs_contain("gentle-guide, fellow-traveler"));
    }

    #[tokio::test]
    async fn unknown_default_persona_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;
        let mut config = NarrativeConfig::default();
        config.engine.default_persona = "wise-owl".into();

        let result = build_app_state(&config, storage, Arc::new(MockProvider::new()));
        assert!(matches!(result, Err(NarrativeError::Config(_))));
    }

    #[tokio::test]
    async fn provider_mode_crystallizer_calls_the_provider() {
        let dir = tempfile::tempdir().unwrap();
        let storage = temp_storage(&dir).await;
        let provider = Arc::new(MockProvider::with_responses(vec![
            r#"{"narrative": "A long day, told gently.", "microCommitment": "What will you rest from?"}"#
                .to_string(),
        ]));
        let mut config = NarrativeConfig::default();
        config.crystallizer.mode = CrystallizerMode::Provider;

        let state = build_app_state(&config, storage, provider.clone()).unwrap();
        let result = state
            .crystallizer
            .crystallize("Today was long and I am worn out")
            .await
            .unwrap();

        assert_eq!(result.narrative, "A long day, told gently.");
        assert_eq!(provider.requests().await.len(), 1);
    }
}
