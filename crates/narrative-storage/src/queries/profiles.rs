// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Profile document operations.

use narrative_core::NarrativeError;
use narrative_core::types::UserProfile;
use rusqlite::{OptionalExtension, params};

use super::{decode, encode};
use crate::database::{Database, map_tr_err};

/// Get the profile for `user_id`, if one exists.
pub async fn get_profile(
    db: &Database,
    user_id: &str,
) -> Result<Option<UserProfile>, NarrativeError> {
    let user_id = user_id.to_string();
    let document = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT document FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    document.as_deref().map(decode).transpose()
}

/// Insert the profile or replace the stored document for the same user.
pub async fn upsert_profile(db: &Database, profile: &UserProfile) -> Result<(), NarrativeError> {
    let document = encode(profile)?;
    let user_id = profile.user_id.clone();
    let created_at = profile.created_at.clone();
    let updated_at = profile.updated_at.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO profiles (user_id, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     document = excluded.document,
                     updated_at = excluded.updated_at",
                params![user_id, document, created_at, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
