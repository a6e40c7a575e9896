// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation document operations, including the atomic turn commit.

use narrative_core::NarrativeError;
use narrative_core::types::{Conversation, DetectedPatterns, UserProfile, now_timestamp};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use super::{decode, encode};
use crate::database::{Database, map_tr_err};

/// Get the active conversation for `user_id`, if one exists.
pub async fn get_conversation(
    db: &Database,
    user_id: &str,
) -> Result<Option<Conversation>, NarrativeError> {
    let user_id = user_id.to_string();
    let document = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT document FROM conversations WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    document.as_deref().map(decode).transpose()
}

/// Write the conversation and merge `patterns` into the owner's profile.
///
/// Both statements run in one transaction. A user without a stored profile
/// only gets the conversation written.
pub async fn commit_turn(
    db: &Database,
    conversation: &Conversation,
    patterns: &DetectedPatterns,
) -> Result<(), NarrativeError> {
    let document = encode(conversation)?;
    let user_id = conversation.user_id.clone();
    let persona = conversation.persona.clone();
    let message_count = conversation.messages.len() as i64;
    let created_at = conversation.created_at.clone();
    let updated_at = conversation.updated_at.clone();
    let patterns = patterns.clone();

    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO conversations
                     (user_id, persona, message_count, document, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id) DO UPDATE SET
                     persona = excluded.persona,
                     message_count = excluded.message_count,
                     document = excluded.document,
                     updated_at = excluded.updated_at",
                params![user_id, persona, message_count, document, created_at, updated_at],
            )?;

            let stored: Option<String> = tx
                .query_row(
                    "SELECT document FROM profiles WHERE user_id = ?1",
                    params![user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(stored) = stored {
                let mut profile: UserProfile = serde_json::from_str(&stored)
                    .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
                profile.detected_patterns.merge(&patterns);
                profile.updated_at = now_timestamp();
                let merged = serde_json::to_string(&profile)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                tx.execute(
                    "UPDATE profiles SET document = ?2, updated_at = ?3 WHERE user_id = ?1",
                    params![user_id, merged, profile.updated_at],
                )?;
            }

            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::profiles::{get_profile, upsert_profile};
    use narrative_core::types::{ChatMessage, MessageLength, Mood};

    #[tokio::test]
    async fn commit_turn_writes_conversation_and_merges_patterns() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_profile(&db, &UserProfile::skeleton("u1")).await.unwrap();

        let mut conversation = Conversation::new("u1", "gentle-guide");
        conversation.messages.push(ChatMessage::user("I feel lost today"));
        conversation.messages.push(ChatMessage::assistant("Tell me more."));
        conversation.emotional_arc.mood = Mood::Confused;
        let patterns = DetectedPatterns {
            typical_message_length: Some(MessageLength::Short),
            ..Default::default()
        };

        commit_turn(&db, &conversation, &patterns).await.unwrap();

        let stored = get_conversation(&db, "u1").await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.emotional_arc.mood, Mood::Confused);
        let profile = get_profile(&db, "u1").await.unwrap().unwrap();
        assert_eq!(
            profile.detected_patterns.typical_message_length,
            Some(MessageLength::Short)
        );
    }

    #[tokio::test]
    async fn commit_turn_without_profile_only_writes_conversation() {
        let db = Database::open_in_memory().await.unwrap();
        let conversation = Conversation::new("ghost", "fellow-traveler");
        commit_turn(&db, &conversation, &DetectedPatterns::default())
            .await
            .unwrap();

        assert!(get_conversation(&db, "ghost").await.unwrap().is_some());
        assert!(get_profile(&db, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_turn_rolls_back_when_profile_document_is_corrupt() {
        let db = Database::open_in_memory().await.unwrap();
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO profiles (user_id, document, created_at, updated_at)
                     VALUES ('u2', 'not json', 'x', 'x')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let conversation = Conversation::new("u2", "gentle-guide");
        let result = commit_turn(&db, &conversation, &DetectedPatterns::default()).await;
        assert!(matches!(result, Err(NarrativeError::Storage { .. })));
        assert!(get_conversation(&db, "u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn later_commit_replaces_earlier_document() {
        let db = Database::open_in_memory().await.unwrap();
        let mut conversation = Conversation::new("u3", "gentle-guide");
        commit_turn(&db, &conversation, &DetectedPatterns::default())
            .await
            .unwrap();
        conversation.messages.push(ChatMessage::user("second"));
        commit_turn(&db, &conversation, &DetectedPatterns::default())
            .await
            .unwrap();

        let stored = get_conversation(&db, "u3").await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(stored.messages[0].content, "second");
    }
}
