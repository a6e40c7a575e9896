// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the JSON API.
//!
//! Bodies use camelCase field names. Failures answer `{"error": "..."}`;
//! internal details go to the log only.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use narrative_core::NarrativeError;
use narrative_core::types::{EmotionalArc, OnboardingQuestion};
use narrative_engine::onboarding::parse_step_key;
use narrative_engine::{RawAnswer, TurnOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::server::AppState;

const CHAT_REQUIRED: &str = "Message and userId are required";
const ONBOARDING_REQUIRED: &str = "userId and step are required";
const INVALID_STEP: &str = "Invalid onboarding step";
const TOO_SHORT: &str = "Entry must be longer than a few words.";
const CHAT_FAILED: &str = "Internal server error";
const ONBOARDING_FAILED: &str = "Onboarding failed";
const CRYSTALLIZE_FAILED: &str = "Failed to crystallize narrative";

/// Request body for POST /api/chat.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Persona key; only consulted when the conversation is created.
    #[serde(default)]
    pub persona: Option<String>,
}

/// Reply sent while onboarding is incomplete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsOnboardingResponse {
    pub needs_onboarding: bool,
    pub onboarding_step: u32,
    pub question: OnboardingQuestion,
}

/// Response body for a successful chat turn.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub emotional_state: EmotionalArc,
    /// Persona display name.
    pub persona: String,
    pub personalized: bool,
    pub user_age: String,
}

/// Request body for POST /api/onboarding.
///
/// `step` may be a number or a numeric string; `response` may be a string,
/// a list of strings or absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub step: Option<Value>,
    #[serde(default)]
    pub response: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub success: bool,
    pub next_step: Option<u32>,
    pub next_question: Option<OnboardingQuestion>,
    pub completed: bool,
}

/// Request body for POST /api/crystallize.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrystallizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps an engine error to a response; server-side failures answer `fallback`.
fn error_response(err: NarrativeError, fallback: &str) -> Response {
    match err {
        NarrativeError::Validation(message) => error_body(StatusCode::BAD_REQUEST, message),
        NarrativeError::InvalidStep { .. } => error_body(StatusCode::BAD_REQUEST, INVALID_STEP),
        NarrativeError::TooShort { .. } => error_body(StatusCode::BAD_REQUEST, TOO_SHORT),
        other => {
            error!(error = %other, "request failed");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}

/// Treats a missing, null or blank string as absent.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/chat
pub async fn post_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(_) => return error_body(StatusCode::BAD_REQUEST, CHAT_REQUIRED),
    };
    let (Some(message), Some(user_id)) = (
        present(body.message.as_deref()),
        present(body.user_id.as_deref()),
    ) else {
        return error_body(StatusCode::BAD_REQUEST, CHAT_REQUIRED);
    };

    match state
        .engine
        .handle_turn(user_id, message, body.persona.as_deref())
        .await
    {
        Ok(TurnOutcome::NeedsOnboarding { step, question }) => Json(NeedsOnboardingResponse {
            needs_onboarding: true,
            onboarding_step: step,
            question,
        })
        .into_response(),
        Ok(TurnOutcome::Reply(turn)) => Json(ChatResponse {
            response: turn.reply,
            emotional_state: turn.emotional_arc,
            persona: turn.persona_name,
            personalized: true,
            user_age: turn.user_age,
        })
        .into_response(),
        Err(e) => error_response(e, CHAT_FAILED),
    }
}

/// GET /api/onboarding-questions
///
/// Returns every question keyed by `stepN`.
pub async fn get_onboarding_questions(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, OnboardingQuestion>> {
    Json(
        state
            .engine
            .onboarding()
            .questions()
            .into_iter()
            .map(|(key, question)| (key, question.clone()))
            .collect(),
    )
}

/// Outcome of reading the `step` field.
#[derive(Debug, PartialEq, Eq)]
enum StepField {
    Missing,
    Invalid,
    Step(u32),
}

fn read_step(value: Option<&Value>) -> StepField {
    match value {
        None | Some(Value::Null) => StepField::Missing,
        Some(Value::String(s)) if s.trim().is_empty() => StepField::Missing,
        Some(Value::String(s)) => parse_step_key(s).map_or(StepField::Invalid, StepField::Step),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map_or(StepField::Invalid, StepField::Step),
        Some(_) => StepField::Invalid,
    }
}

fn read_answer(value: Option<Value>) -> RawAnswer {
    match value {
        None | Some(Value::Null) => RawAnswer::Missing,
        Some(Value::String(s)) => RawAnswer::Text(s),
        Some(Value::Array(items)) => RawAnswer::List(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
        ),
        Some(other) => RawAnswer::Text(other.to_string()),
    }
}

/// POST /api/onboarding and POST /api/onboarding-questions
pub async fn post_onboarding(
    State(state): State<AppState>,
    body: Result<Json<OnboardingRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(_) => return error_body(StatusCode::BAD_REQUEST, ONBOARDING_REQUIRED),
    };
    let Some(user_id) = present(body.user_id.as_deref()) else {
        return error_body(StatusCode::BAD_REQUEST, ONBOARDING_REQUIRED);
    };
    let step = match read_step(body.step.as_ref()) {
        StepField::Missing => return error_body(StatusCode::BAD_REQUEST, ONBOARDING_REQUIRED),
        StepField::Invalid => return error_body(StatusCode::BAD_REQUEST, INVALID_STEP),
        StepField::Step(step) => step,
    };

    match state
        .engine
        .submit_onboarding_answer(user_id, step, read_answer(body.response))
        .await
    {
        Ok(outcome) => Json(OnboardingResponse {
            success: true,
            next_step: outcome.next_step,
            next_question: outcome.next_question,
            completed: outcome.completed,
        })
        .into_response(),
        Err(e) => error_response(e, ONBOARDING_FAILED),
    }
}

/// POST /api/crystallize
///
/// Uses `text` when given; otherwise the named user's recent transcript.
pub async fn post_crystallize(
    State(state): State<AppState>,
    body: Result<Json<CrystallizeRequest>, JsonRejection>,
) -> Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let text = match (body.text, present(body.user_id.as_deref())) {
        (Some(text), _) => text,
        (None, Some(user_id)) => match state
            .engine
            .recent_transcript(user_id, state.context_turns)
            .await
        {
            Ok(transcript) => transcript.unwrap_or_default(),
            Err(e) => return error_response(e, CRYSTALLIZE_FAILED),
        },
        (None, None) => String::new(),
    };

    match state.crystallizer.crystallize(&text).await {
        Ok(crystallization) => Json(crystallization).into_response(),
        Err(e) => error_response(e, CRYSTALLIZE_FAILED),
    }
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "Narrative AI Server Running".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_reads_camel_case() {
        let req: ChatRequest =
            serde_json::from_value(json!({"message": "hi", "userId": "u1"})).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
        assert_eq!(req.user_id.as_deref(), Some("u1"));
        assert!(req.persona.is_none());
    }

    #[test]
    fn step_accepts_numbers_and_numeric_strings() {
        assert_eq!(read_step(Some(&json!(2))), StepField::Step(2));
        assert_eq!(read_step(Some(&json!("3"))), StepField::Step(3));
        assert_eq!(read_step(Some(&json!("step4"))), StepField::Step(4));
    }

    #[test]
    fn step_missing_forms() {
        assert_eq!(read_step(None), StepField::Missing);
        assert_eq!(read_step(Some(&Value::Null)), StepField::Missing);
        assert_eq!(read_step(Some(&json!("  "))), StepField::Missing);
    }

    #[test]
    fn step_invalid_forms() {
        assert_eq!(read_step(Some(&json!("abc"))), StepField::Invalid);
        assert_eq!(read_step(Some(&json!(-1))), StepField::Invalid);
        assert_eq!(read_step(Some(&json!(1.5))), StepField::Invalid);
        assert_eq!(read_step(Some(&json!(true))), StepField::Invalid);
    }

    #[test]
    fn answers_convert_from_json() {
        assert_eq!(read_answer(None), RawAnswer::Missing);
        assert_eq!(read_answer(Some(json!("adult"))), RawAnswer::Text("adult".into()));
        assert_eq!(
            read_answer(Some(json!(["music", null, 3]))),
            RawAnswer::List(vec!["music".into(), "3".into()])
        );
    }

    #[tokio::test]
    async fn health_payload_is_fixed() {
        let Json(body) = get_health().await;
        insta::assert_json_snapshot!(body, @r###"
        {
          "status": "OK",
          "message": "Narrative AI Server Running"
        }
        "###);
    }
}
