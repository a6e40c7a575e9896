// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the JSON API.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use narrative_core::NarrativeError;
use narrative_engine::{ConversationEngine, Crystallizer};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub crystallizer: Arc<dyn Crystallizer>,
    /// Stored messages fed to the crystallizer when a request names a user instead of text.
    pub context_turns: usize,
}

/// Server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the API router:
/// - POST /api/chat
/// - GET /api/onboarding-questions
/// - POST /api/onboarding (alias: POST /api/onboarding-questions)
/// - POST /api/crystallize
/// - GET /health
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/chat", post(handlers::post_chat))
        .route(
            "/api/onboarding-questions",
            get(handlers::get_onboarding_questions).post(handlers::post_onboarding),
        )
        .route("/api/onboarding", post(handlers::post_onboarding))
        .route("/api/crystallize", post(handlers::post_crystallize))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds to `host:port` and serves until `cancel` fires.
///
/// In-flight requests are drained before this returns.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), NarrativeError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NarrativeError::Internal(format!("failed to bind server to {addr}: {e}")))?;

    tracing::info!("Narrative server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| NarrativeError::Internal(format!("server error: {e}")))?;

    tracing::info!("Narrative server stopped");
    Ok(())
}
