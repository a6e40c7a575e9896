// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP JSON API for the Narrative journaling assistant.
//!
//! Thin transport over [`narrative_engine::ConversationEngine`]: handlers
//! validate request shape, call the engine and map its errors to status
//! codes with short `{"error": ...}` bodies.

pub mod handlers;
pub mod server;

pub use server::{AppState, ServerConfig, router, start_server};
