// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrative - a conversational journaling assistant.
//!
//! This is the binary entry point for the Narrative server.

mod serve;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use narrative_config::{ConfigError, NarrativeConfig};
use narrative_persona::PersonaCatalog;

/// Narrative - a conversational journaling assistant.
#[derive(Parser, Debug)]
#[command(name = "narrative", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP server (default).
    Serve,
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> Result<NarrativeConfig, Vec<ConfigError>> {
    match path {
        Some(path) => narrative_config::load_and_validate_path(path),
        None => narrative_config::load_and_validate(),
    }
}

/// Renders a one-screen summary of the effective configuration.
fn config_summary(config: &NarrativeConfig) -> String {
    let key_source = match config.anthropic.api_key.as_deref() {
        Some(key) if !key.is_empty() => "config",
        _ if std::env::var_os("ANTHROPIC_API_KEY").is_some() => "ANTHROPIC_API_KEY",
        _ => "missing",
    };
    [
        format!("server:        {}:{}", config.server.host, config.server.port),
        format!("database:      {}", config.storage.database_path),
        format!("model:         {}", config.anthropic.default_model),
        format!("api key:       {key_source}"),
        format!("persona:       {}", config.engine.default_persona),
        format!("crystallizer:  {:?}", config.crystallizer.mode),
    ]
    .join("\n")
}

fn check_config(config: &NarrativeConfig) -> ExitCode {
    if let Err(e) = PersonaCatalog::builtin(&config.engine.default_persona) {
        eprintln!("narrative: {e}");
        return ExitCode::FAILURE;
    }
    println!("{}", config_summary(config));
    println!("narrative: configuration OK");
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            narrative_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => match serve::run_serve(config).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("narrative: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::CheckConfig => check_config(&config),
    }
}
