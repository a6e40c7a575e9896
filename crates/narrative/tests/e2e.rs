// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete journaling pipeline over HTTP.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a scripted
//! provider, then drives the router exactly as a client would.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use narrative_core::StorageAdapter;
use narrative_engine::RuleBasedCrystallizer;
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

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn onboard(app: &Router, user_id: &str) {
    for (step, response) in [
        (json!(1), json!("young-adult")),
        (json!(2), json!("casual")),
        (json!(3), json!("gaming, music")),
        (json!(4), json!("direct-support")),
    ] {
        let (status, _) = post(
            app,
            "/api/onboarding",
            json!({"userId": user_id, "step": step, "response": response}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn onboarding_then_chat_then_crystallize() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec![
            "Being lost is where many stories start.".into(),
            "Frustration is information.".into(),
        ])
        .build()
        .await
        .unwrap();
    let app = app(&harness);

    let (_, gate) = post(&app, "/api/chat", json!({"message": "hey", "userId": "ana"})).await;
    assert_eq!(gate["needsOnboarding"], true);

    onboard(&app, "ana").await;

    let (status, first) = post(
        &app,
        "/api/chat",
        json!({"message": "I feel lost lately", "userId": "ana", "persona": "fellow-traveler"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["persona"], "The Fellow Traveler");
    assert_eq!(first["userAge"], "young-adult");
    assert_eq!(first["emotionalState"]["mood"], "sad");

    let (_, second) = post(
        &app,
        "/api/chat",
        json!({"message": "now I'm just frustrated", "userId": "ana", "persona": "gentle-guide"}),
    )
    .await;
    assert_eq!(second["persona"], "The Fellow Traveler");
    assert_eq!(second["emotionalState"]["mood"], "angry");
    assert_eq!(second["emotionalState"]["themes"], json!(["sad", "angry"]));

    let conversation = harness.storage.get_conversation("ana").await.unwrap().unwrap();
    assert_eq!(conversation.messages.len(), 4);
    assert_eq!(conversation.persona, "fellow-traveler");

    let (status, crystal) = post(&app, "/api/crystallize", json!({"userId": "ana"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        crystal["narrative"]
            .as_str()
            .unwrap()
            .contains("heavy feeling"),
        "got: {crystal}"
    );
}

#[tokio::test]
async fn chat_prompt_carries_profile_and_safety_sections() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    onboard(&app, "sam").await;

    let (status, _) = post(
        &app,
        "/api/chat",
        json!({"message": "honestly I want to die", "userId": "sam"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let prompt = harness.mock_provider.last_prompt().await.unwrap();
    assert!(prompt.contains("young-adult"), "prompt: {prompt}");
    assert!(prompt.contains("SAFETY OVERRIDE"), "prompt: {prompt}");
    assert!(prompt.contains("ACTIVE NOW"), "prompt: {prompt}");
    assert!(prompt.contains("Now respond to: \"honestly I want to die\""));
}

#[tokio::test]
async fn users_are_isolated() {
    let harness = TestHarness::new().await.unwrap();
    let app = app(&harness);
    onboard(&app, "a").await;

    let (_, other) = post(&app, "/api/chat", json!({"message": "hi", "userId": "b"})).await;
    assert_eq!(other["needsOnboarding"], true);

    let (status, mine) = post(&app, "/api/chat", json!({"message": "hi", "userId": "a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["response"], "mock response");
    assert!(harness.storage.get_conversation("b").await.unwrap().is_none());
}
