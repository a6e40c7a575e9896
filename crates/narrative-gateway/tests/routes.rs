// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driving the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use narrative_core::StorageAdapter;
use narrative_engine::RuleBasedCrystallizer;
use narrative_engine::crystallizer::MICRO_COMMITMENTS;
use narrative_gateway::{AppState, router};
use narrative_test_utils::TestHarness;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app(harness: &TestHarness) -> Router {
    router(AppState {
        engine: harness.engine.clone(),
        crystallizer: Arc::new(RuleBasedCrystallizer::default()),
        context_turns: 10,
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_running() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(&app(&harness), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "Narrative AI Server Running");
}

#[tokio::test]
async fn chat_requires_message_and_user() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    for body in [json!({"message": "hi"}), json!({"userId": "u1"}), json!({"message": "", "userId": "u1"})] {
        let (status, body) = send(&app, Method::POST, "/api/chat", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message and userId are required");
    }
}

#[tokio::test]
async fn chat_before_onboarding_returns_first_question() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/chat",
        Some(json!({"message": "hello", "userId": "fresh"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["needsOnboarding"], true);
    assert_eq!(body["onboardingStep"], 1);
    assert_eq!(body["question"]["type"], "single-choice");
    assert!(harness.storage.get_conversation("fresh").await.unwrap().is_none());
}

#[tokio::test]
async fn chat_after_onboarding_returns_personalized_reply() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["That sounds exhausting.".into()])
        .build()
        .await
        .unwrap();
    harness.onboard("u1", "adult").await.unwrap();

    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/chat",
        Some(json!({"message": "I feel so worried today", "userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "That sounds exhausting.");
    assert_eq!(body["personalized"], true);
    assert_eq!(body["userAge"], "adult");
    assert_eq!(body["persona"], "The Gentle Guide");
    assert_eq!(body["emotionalState"]["mood"], "anxious");
    assert_eq!(body["emotionalState"]["themes"], json!(["anxious"]));
}

#[tokio::test]
async fn chat_generation_failure_is_internal_error() {
    let harness = TestHarness::new().await.unwrap();
    harness.onboard("u1", "adult").await.unwrap();
    harness.mock_provider.fail_next("upstream down").await;

    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/chat",
        Some(json!({"message": "hello", "userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Internal server error"}));
    assert_eq!(harness.message_count("u1").await.unwrap(), 0);
}

#[tokio::test]
async fn onboarding_questions_are_keyed_by_step() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(&app(&harness), Method::GET, "/api/onboarding-questions", None).await;

    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["step1", "step2", "step3", "step4"]);
    assert_eq!(body["step3"]["type"], "text-input");
    assert_eq!(body["step3"]["optional"], true);
}

#[tokio::test]
async fn onboarding_first_step_advances() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/onboarding",
        Some(json!({"userId": "u1", "step": 1, "response": "adult"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["nextStep"], 2);
    assert_eq!(body["completed"], false);
    assert!(body["nextQuestion"].is_object());
}

#[tokio::test]
async fn onboarding_alias_route_completes_flow() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    let answers = [
        json!({"userId": "u1", "step": "1", "response": "teen"}),
        json!({"userId": "u1", "step": "2", "response": "casual"}),
        json!({"userId": "u1", "step": "3", "response": ["music", "art"]}),
        json!({"userId": "u1", "step": "4", "response": "story-focused"}),
    ];

    let mut last = Value::Null;
    for answer in answers {
        let (status, body) = send(&app, Method::POST, "/api/onboarding-questions", Some(answer)).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
    }

    assert_eq!(last["completed"], true);
    assert!(last["nextStep"].is_null());
    assert!(last["nextQuestion"].is_null());

    let profile = harness.storage.get_profile("u1").await.unwrap().unwrap();
    assert!(profile.is_complete());
    assert_eq!(profile.interests, vec!["music".to_string(), "art".to_string()]);
}

#[tokio::test]
async fn onboarding_rejects_missing_and_unknown_steps() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    let (status, body) = send(&app, Method::POST, "/api/onboarding", Some(json!({"userId": "u1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and step are required");

    let (status, body) = send(&app, Method::POST, "/api/onboarding", Some(json!({"step": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "userId and step are required");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/onboarding",
        Some(json!({"userId": "u1", "step": 9, "response": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid onboarding step");
}

#[tokio::test]
async fn onboarding_rejects_unknown_option() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/onboarding",
        Some(json!({"userId": "u1", "step": 1, "response": "ancient"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid response"));
    assert!(harness.storage.get_profile("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn crystallize_text_uses_feeling_template() {
    let harness = TestHarness::new().await.unwrap();
    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/crystallize",
        Some(json!({"text": "I feel completely overwhelmed today"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["narrative"].as_str().unwrap().contains("heavy feeling"));
    let commitment = body["microCommitment"].as_str().unwrap();
    assert!(MICRO_COMMITMENTS.contains(&commitment));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn crystallize_rejects_short_entries() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);

    for body in [json!({"text": "hi"}), json!({})] {
        let (status, body) = send(&app, Method::POST, "/api/crystallize", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Entry must be longer than a few words.");
    }
}

#[tokio::test]
async fn crystallize_falls_back_to_stored_transcript() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["I hear you.".into()])
        .build()
        .await
        .unwrap();
    harness.onboard("u1", "adult").await.unwrap();
    harness.chat("u1", "I can't focus on anything").await.unwrap();

    let (status, body) = send(
        &app(&harness),
        Method::POST,
        "/api/crystallize",
        Some(json!({"userId": "u1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let narrative = body["narrative"].as_str().unwrap();
    assert!(narrative.contains("impossible to focus on anything"), "got: {narrative}");
}
