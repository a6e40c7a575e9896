// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for Narrative profiles and conversations.
//!
//! Documents are stored as JSON keyed by user id, behind a single-writer
//! `tokio-rusqlite` connection with embedded refinery migrations.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
