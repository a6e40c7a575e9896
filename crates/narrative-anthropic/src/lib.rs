// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API as a Narrative completion provider.
//!
//! The engine hands over one assembled prompt and gets back one block of
//! text; nothing here knows about personas or journaling.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use narrative_config::model::NarrativeConfig;
use narrative_core::NarrativeError;
use narrative_core::traits::{PluginAdapter, ProviderAdapter};
use narrative_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest, MessageResponse};

const KEY_VAR: &str = "ANTHROPIC_API_KEY";

pub struct AnthropicProvider {
    client: AnthropicClient,
    fallback_model: String,
    fallback_temperature: f32,
}

impl AnthropicProvider {
    /// Fails with [`NarrativeError::Config`] when no API key can be found.
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let settings = &config.anthropic;
        let key = resolve_api_key(settings.api_key.as_deref())?;
        let client = AnthropicClient::new(
            &key,
            &settings.api_version,
            Duration::from_secs(settings.timeout_secs),
        )?;
        info!(
            model = %settings.default_model,
            timeout_secs = settings.timeout_secs,
            "completion provider ready"
        );
        Ok(Self {
            client,
            fallback_model: settings.default_model.clone(),
            fallback_temperature: settings.temperature,
        })
    }

    /// Fills in the model and temperature the caller left unset.
    fn message_request(&self, request: ProviderRequest) -> MessageRequest {
        let model = if request.model.is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };
        MessageRequest {
            model,
            messages: request
                .messages
                .into_iter()
                .map(|turn| ApiMessage {
                    role: turn.role,
                    content: turn.content,
                })
                .collect(),
            system: request.system_prompt,
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature.unwrap_or(self.fallback_temperature)),
        }
    }
}

impl From<MessageResponse> for ProviderResponse {
    fn from(reply: MessageResponse) -> Self {
        ProviderResponse {
            content: reply.text(),
            usage: TokenUsage {
                input_tokens: reply.usage.input_tokens,
                output_tokens: reply.usage.output_tokens,
            },
            id: reply.id,
            model: reply.model,
            stop_reason: reply.stop_reason,
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, NarrativeError> {
        // No probe call; a bad key surfaces on the first turn.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NarrativeError> {
        debug!("completion provider stopped");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, NarrativeError> {
        let outgoing = self.message_request(request);
        let reply = self.client.complete_message(&outgoing).await?;
        Ok(reply.into())
    }
}

/// A non-empty configured key wins; otherwise `ANTHROPIC_API_KEY`.
fn resolve_api_key(configured: Option<&str>) -> Result<String, NarrativeError> {
    configured
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(KEY_VAR).ok().filter(|key| !key.is_empty()))
        .ok_or_else(|| {
            NarrativeError::Config(format!(
                "Anthropic API key not found. Set anthropic.api_key in config or {KEY_VAR} environment variable."
            ))
        })
}
