// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Compiled defaults come first, then TOML files, then `NARRATIVE_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is an external type

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::NarrativeConfig;

const FILE_NAME: &str = "narrative.toml";
const SYSTEM_PATH: &str = "/etc/narrative/narrative.toml";

/// Top-level sections; the env provider splits variable names on these.
const SECTIONS: [&str; 6] = ["app", "server", "anthropic", "storage", "engine", "crystallizer"];

/// Where configuration is read from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// `/etc/narrative`, then the user config dir, then `./narrative.toml`, then env.
    Standard,
    /// A single file, then env.
    File(PathBuf),
    /// A TOML string only; the environment is ignored.
    Inline(String),
}

impl ConfigSource {
    /// Standard file locations, lowest precedence first.
    fn standard_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(SYSTEM_PATH)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("narrative").join(FILE_NAME));
        }
        paths.push(
            std::env::current_dir()
                .map(|d| d.join(FILE_NAME))
                .unwrap_or_else(|_| PathBuf::from(FILE_NAME)),
        );
        paths
    }

    /// The figment for this source, before extraction.
    pub fn figment(&self) -> Figment {
        let base = Figment::new().merge(Serialized::defaults(NarrativeConfig::default()));
        match self {
            ConfigSource::Standard => Self::standard_paths()
                .into_iter()
                .fold(base, |figment, path| figment.merge(Toml::file(path)))
                .merge(env_provider()),
            ConfigSource::File(path) => base.merge(Toml::file(path)).merge(env_provider()),
            ConfigSource::Inline(content) => base.merge(Toml::string(content)),
        }
    }

    /// `(name, content)` of every TOML text this source reads, for diagnostics.
    pub fn texts(&self) -> Vec<(String, String)> {
        let read = |path: &Path| {
            std::fs::read_to_string(path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        };
        match self {
            ConfigSource::Standard => Self::standard_paths()
                .iter()
                .filter_map(|p| read(p))
                .collect(),
            ConfigSource::File(path) => read(path).into_iter().collect(),
            ConfigSource::Inline(content) => vec![("<inline>".to_string(), content.clone())],
        }
    }

    pub fn load(&self) -> Result<NarrativeConfig, figment::Error> {
        self.figment().extract()
    }
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<NarrativeConfig, figment::Error> {
    ConfigSource::Inline(toml_content.to_string()).load()
}

fn env_provider() -> Env {
    Env::prefixed("NARRATIVE_").map(|key| env_key_path(key.as_str()).into())
}

/// Maps `ENGINE_HISTORY_WINDOW` (prefix already stripped) to
/// `engine.history_window`.
///
/// Names are matched without regard to case. Only the first underscore after
/// a known section name becomes a dot, so keys that contain underscores
/// survive intact.
fn env_key_path(raw: &str) -> String {
    let key = raw.to_ascii_lowercase();
    SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or(key)
}
