// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire shapes for the Messages endpoint.
//!
//! Only the fields a journaling reply needs are modelled; anything else the
//! API returns is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Body of `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub messages: Vec<ApiMessage>,
    /// Persona prompt, sent as the top-level `system` string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// One conversation turn with plain-text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

/// Successful reply.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub model: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Usage,
}

impl MessageResponse {
    /// The reply text, with non-text blocks dropped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                out.push_str(text);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Body sent alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(system: Option<&str>, temperature: Option<f32>) -> MessageRequest {
        MessageRequest {
            model: "claude-3-5-sonnet-20240620".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Work was a lot today".into(),
            }],
            system: system.map(str::to_string),
            max_tokens: 800,
            temperature,
        }
    }

    #[test]
    fn absent_options_are_left_out_of_the_body() {
        let body = serde_json::to_value(entry(None, None)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-3-5-sonnet-20240620",
                "messages": [{"role": "user", "content": "Work was a lot today"}],
                "max_tokens": 800
            })
        );
    }

    #[test]
    fn persona_prompt_travels_as_system() {
        let body = serde_json::to_value(entry(Some("Be kind."), Some(0.5))).unwrap();
        assert_eq!(body["system"], "Be kind.");
        assert_eq!(body["temperature"], 0.5);
    }

    #[test]
    fn reply_text_ignores_thinking_blocks() {
        let reply: MessageResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Hello, "},
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "friend."}
            ],
            "model": "claude-3-5-sonnet-20240620",
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(reply.text(), "Hello, friend.");
        assert_eq!(reply.usage.output_tokens, 0);
    }

    #[test]
    fn error_kind_comes_from_the_type_field() {
        let err: ApiErrorResponse = serde_json::from_value(json!({
            "type": "error",
            "error": {"type": "overloaded_error", "message": "Overloaded"}
        }))
        .unwrap();
        assert_eq!(err.error.kind, "overloaded_error");
        assert_eq!(err.error.message, "Overloaded");
    }
}
