// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with scripted replies,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use narrative_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use narrative_core::{NarrativeError, PluginAdapter, ProviderAdapter};

/// One scripted provider behavior.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fail with a provider error carrying this message.
    Fail(String),
    /// Sleep before answering; used to exercise timeouts and lock ordering.
    Delayed(Duration, String),
}

/// A mock provider that pops replies from a FIFO queue.
///
/// When the queue is empty, a default "mock response" text is returned.
/// Every request is recorded for later inspection.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with text replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(
                responses.into_iter().map(MockReply::Text).collect(),
            )),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.push(MockReply::Text(text.into())).await;
    }

    /// Make the next call fail.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.push(MockReply::Fail(message.into())).await;
    }

    pub async fn push(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// The prompt text of the most recent request.
    pub async fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .await
            .last()
            .and_then(|r| r.messages.last())
            .map(|m| m.content.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, NarrativeError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NarrativeError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> Result<ProviderResponse, NarrativeError> {
        self.requests.lock().await.push(request.clone());
        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text("mock response".to_string()));

        let text = match reply {
            MockReply::Text(text) => text,
            MockReply::Fail(message) => {
                return Err(NarrativeError::Provider {
                    message,
                    source: None,
                });
            }
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                text
            }
        };

        let prompt_words: usize = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count())
            .sum();
        let usage = TokenUsage {
            input_tokens: u32::try_from(prompt_words).unwrap_or(u32::MAX),
            output_tokens: u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX),
        };
        Ok(ProviderResponse {
            id: format!("mock-{}", uuid::Uuid::new_v4().simple()),
            model: request.model,
            stop_reason: Some("end_turn".into()),
            content: text,
            usage,
        })
    }
}
