// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Narrative journaling assistant.
//!
//! Strict TOML (`deny_unknown_fields`) layered over compiled defaults,
//! `NARRATIVE_*` environment overrides, semantic validation, and miette
//! diagnostics with "did you mean" suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use narrative_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{ConfigSource, load_config_from_str};
pub use model::NarrativeConfig;

/// Loads `source` and validates the result.
///
/// Deserialization failures become diagnostics pointing into the TOML text
/// they came from; validation reports every failed check at once.
pub fn load_and_validate_from(source: &ConfigSource) -> Result<NarrativeConfig, Vec<ConfigError>> {
    let config = source
        .load()
        .map_err(|err| diagnostic::figment_to_config_errors(err, &source.texts()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

/// Standard locations plus environment.
pub fn load_and_validate() -> Result<NarrativeConfig, Vec<ConfigError>> {
    load_and_validate_from(&ConfigSource::Standard)
}

/// One explicit file plus environment.
pub fn load_and_validate_path(path: &Path) -> Result<NarrativeConfig, Vec<ConfigError>> {
    load_and_validate_from(&ConfigSource::File(path.to_path_buf()))
}

pub fn load_and_validate_str(toml_content: &str) -> Result<NarrativeConfig, Vec<ConfigError>> {
    load_and_validate_from(&ConfigSource::Inline(toml_content.to_string()))
}
