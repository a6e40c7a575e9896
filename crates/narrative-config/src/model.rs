// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed configuration sections.
//!
//! Every section rejects keys it does not know and fills omitted keys from
//! its `Default` impl, so a partial file is always valid input.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of `narrative.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrativeConfig {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub anthropic: AnthropicConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
    pub crystallizer: CrystallizerConfig,
}

/// Process identity and log verbosity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub name: String,
    /// One of trace, debug, info, warn or error.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "narrative".into(),
            log_level: "info".into(),
        }
    }
}

/// Listen address of the HTTP API.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

/// Completion service credentials and sampling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnthropicConfig {
    /// Falls back to `ANTHROPIC_API_KEY` when unset or empty.
    pub api_key: Option<String>,
    pub default_model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: "claude-3-5-sonnet-20240620".into(),
            api_version: "2023-06-01".into(),
            max_tokens: 800,
            temperature: 0.6,
            timeout_secs: 60,
        }
    }
}

/// SQLite location and journal mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub database_path: String,
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|dir| dir.join("narrative").join("narrative.db"))
            .unwrap_or_else(|| PathBuf::from("narrative.db"));
        Self {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        }
    }
}

/// Knobs for the chat turn pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Used when a chat request names no persona or an unknown one.
    pub default_persona: String,
    /// Trailing messages quoted into the prompt.
    pub history_window: usize,
    /// Trailing history entries (either role) the style analyzer reads;
    /// assistant entries are ignored.
    pub style_window: usize,
    /// Distinct themes kept on the emotional arc.
    pub theme_cap: usize,
    pub turn_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_persona: "gentle-guide".into(),
            history_window: 8,
            style_window: 3,
            theme_cap: 10,
            turn_timeout_secs: 90,
        }
    }
}

/// Which crystallizer serves `/api/crystallize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrystallizerMode {
    /// Canned templates keyed on literal cues.
    #[default]
    Rules,
    /// Ask the completion service, falling back to rules.
    Provider,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrystallizerConfig {
    pub mode: CrystallizerMode,
    /// Shortest accepted entry, in characters after trimming.
    pub min_length: usize,
    /// Stored messages used when a request names a user instead of text.
    pub context_turns: usize,
}

impl Default for CrystallizerConfig {
    fn default() -> Self {
        Self {
            mode: CrystallizerMode::Rules,
            min_length: 5,
            context_turns: 10,
        }
    }
}
