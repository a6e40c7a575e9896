// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thin reqwest wrapper around `POST /v1/messages`.
//!
//! Every call is attempted at most twice: a second attempt happens only when
//! the first one ends in a status the API documents as temporary.

use std::time::Duration;

use narrative_core::NarrativeError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ATTEMPTS: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// What a single round trip produced.
enum Attempt {
    Completed(MessageResponse),
    /// Worth one more try; carries the description for the final error.
    Temporary(String),
    Failed(NarrativeError),
}

/// Authenticated client for the Messages endpoint.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AnthropicClient {
    /// Builds a client that sends `api_key` and `api_version` on every call.
    pub fn new(api_key: &str, api_version: &str, timeout: Duration) -> Result<Self, NarrativeError> {
        let headers = auth_headers(api_key, api_version)?;
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| provider_error("could not create the HTTP client", e))?;

        Ok(Self {
            http,
            endpoint: MESSAGES_ENDPOINT.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn pointed_at(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    /// Sends `request`, retrying once on 429, 500, 503 or 529.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, NarrativeError> {
        let mut last_failure = String::new();
        for attempt in 1..=ATTEMPTS {
            match self.attempt(request).await {
                Attempt::Completed(response) => return Ok(response),
                Attempt::Failed(err) => return Err(err),
                Attempt::Temporary(description) => {
                    if attempt < ATTEMPTS {
                        warn!(attempt, failure = %description, "completion hit a temporary failure");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    last_failure = description;
                }
            }
        }

        Err(NarrativeError::Provider {
            message: last_failure,
            source: None,
        })
    }

    async fn attempt(&self, request: &MessageRequest) -> Attempt {
        let response = match self.http.post(&self.endpoint).json(request).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(provider_error("request to the Messages API failed", e)),
        };

        let status = response.status();
        debug!(%status, model = %request.model, "Messages API answered");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status.is_success() => {
                return Attempt::Failed(provider_error("could not read the completion body", e));
            }
            Err(_) => String::new(),
        };

        if status.is_success() {
            return match serde_json::from_str(&body) {
                Ok(parsed) => Attempt::Completed(parsed),
                Err(e) => Attempt::Failed(provider_error("completion body was not a message", e)),
            };
        }

        let description = describe_failure(status, &body);
        if is_temporary(status) {
            Attempt::Temporary(description)
        } else {
            Attempt::Failed(NarrativeError::Provider {
                message: description,
                source: None,
            })
        }
    }
}

fn auth_headers(api_key: &str, api_version: &str) -> Result<HeaderMap, NarrativeError> {
    let value = |name: &str, raw: &str| {
        HeaderValue::from_str(raw)
            .map_err(|e| NarrativeError::Config(format!("{name} is not a valid header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-api-key"), value("API key", api_key)?);
    headers.insert(
        HeaderName::from_static("anthropic-version"),
        value("API version", api_version)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn provider_error<E>(context: &str, err: E) -> NarrativeError
where
    E: std::error::Error + Send + Sync + 'static,
{
    NarrativeError::Provider {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}

fn is_temporary(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => format!(
            "Anthropic API error ({}): {}",
            parsed.error.kind, parsed.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AnthropicClient {
        AnthropicClient::new("journal-key", "2023-06-01", Duration::from_secs(5))
            .unwrap()
            .pointed_at(&server.uri())
    }

    fn journal_entry() -> MessageRequest {
        MessageRequest {
            model: "claude-3-5-sonnet-20240620".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "I had a rough day".into(),
            }],
            system: Some("You are a gentle guide.".into()),
            max_tokens: 800,
            temperature: Some(0.6),
        }
    }

    fn reply(id: &str, text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-3-5-sonnet-20240620",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 42, "output_tokens": 7}
        }))
    }

    fn api_error(status: u16, kind: &str) -> ResponseTemplate {
        let body: Value = json!({"type": "error", "error": {"type": kind, "message": "details"}});
        ResponseTemplate::new(status).set_body_json(body)
    }

    async fn failure_text(server: &MockServer) -> String {
        client_for(server)
            .complete_message(&journal_entry())
            .await
            .unwrap_err()
            .to_string()
    }

    #[tokio::test]
    async fn returns_the_assistant_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"max_tokens": 800, "system": "You are a gentle guide."})))
            .respond_with(reply("msg_1", "That sounds heavy."))
            .mount(&server)
            .await;

        let message = client_for(&server).complete_message(&journal_entry()).await.unwrap();
        assert_eq!(message.id, "msg_1");
        assert_eq!(message.usage.input_tokens, 42);
        assert_eq!(message.text(), "That sounds heavy.");
    }

    #[tokio::test]
    async fn rate_limit_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(api_error(429, "rate_limit_error"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(reply("msg_2", "Second time lucky."))
            .mount(&server)
            .await;

        let message = client_for(&server).complete_message(&journal_entry()).await.unwrap();
        assert_eq!(message.id, "msg_2");
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(api_error(400, "invalid_request_error"))
            .expect(1)
            .mount(&server)
            .await;

        let err = failure_text(&server).await;
        assert!(err.contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn overload_gives_up_after_second_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(api_error(529, "overloaded_error"))
            .expect(2)
            .mount(&server)
            .await;

        let err = failure_text(&server).await;
        assert!(err.contains("overloaded_error"), "got: {err}");
    }

    #[tokio::test]
    async fn plain_text_failure_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let err = failure_text(&server).await;
        assert!(err.contains("401"), "got: {err}");
        assert!(err.contains("unauthorized"), "got: {err}");
    }

    #[tokio::test]
    async fn authentication_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "journal-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(header("content-type", "application/json"))
            .respond_with(reply("msg_3", "ok"))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client_for(&server).complete_message(&journal_entry()).await.is_ok());
    }

    #[test]
    fn header_with_newline_is_a_config_error() {
        let result = AnthropicClient::new("bad\nkey", "2023-06-01", Duration::from_secs(1));
        assert!(matches!(result, Err(NarrativeError::Config(_))));
    }
}
