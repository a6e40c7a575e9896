// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Range and sanity checks that serde cannot express.

use std::net::IpAddr;

use crate::diagnostic::ConfigError;
use crate::model::NarrativeConfig;

#[derive(Default)]
struct Findings(Vec<ConfigError>);

impl Findings {
    fn require(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(ConfigError::Validation { message: message() });
        }
    }

    fn positive(&mut self, key: &str, value: u64) {
        self.require(value > 0, || format!("{key} must be greater than 0"));
    }
}

fn plausible_host(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
        || host
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':'))
}

/// Runs every check and reports all failures together.
pub fn validate_config(config: &NarrativeConfig) -> Result<(), Vec<ConfigError>> {
    let mut found = Findings::default();

    let host = config.server.host.trim();
    if host.is_empty() {
        found.require(false, || "server.host must not be empty".into());
    } else {
        found.require(plausible_host(host), || {
            format!("server.host `{host}` is not a valid IP address or hostname")
        });
    }
    found.require(config.server.port != 0, || {
        "server.port must be between 1 and 65535".into()
    });
    found.require(!config.storage.database_path.trim().is_empty(), || {
        "storage.database_path must not be empty".into()
    });

    let temperature = config.anthropic.temperature;
    found.require((0.0..=1.0).contains(&temperature), || {
        format!("anthropic.temperature must be within 0.0..=1.0, got {temperature}")
    });
    found.positive("anthropic.max_tokens", config.anthropic.max_tokens.into());
    found.positive("anthropic.timeout_secs", config.anthropic.timeout_secs);

    found.require(!config.engine.default_persona.trim().is_empty(), || {
        "engine.default_persona must not be empty".into()
    });
    let engine = &config.engine;
    let crystallizer = &config.crystallizer;
    for (key, value) in [
        ("engine.history_window", engine.history_window),
        ("engine.style_window", engine.style_window),
        ("engine.theme_cap", engine.theme_cap),
        ("crystallizer.min_length", crystallizer.min_length),
        ("crystallizer.context_turns", crystallizer.context_turns),
    ] {
        found.positive(key, value as u64);
    }
    found.positive("engine.turn_timeout_secs", engine.turn_timeout_secs);

    if found.0.is_empty() { Ok(()) } else { Err(found.0) }
}
