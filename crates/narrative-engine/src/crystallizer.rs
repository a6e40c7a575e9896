// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrative crystallization: condensing a journal excerpt into a short
//! narrative and a reflective micro-commitment question.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use narrative_core::types::{ProviderMessage, ProviderRequest, now_timestamp};
use narrative_core::{NarrativeError, ProviderAdapter};
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Candidate follow-up questions; one is drawn uniformly per crystallization.
pub const MICRO_COMMITMENTS: [&str; 5] = [
    "What is one small thing you could do in the next hour to care for yourself?",
    "Who is one person you could reach out to today, even with a short message?",
    "What is one thing you are willing to set down, just for tonight?",
    "What would a kinder next step look like for you tomorrow morning?",
    "What is one tiny action that would make today feel a little lighter?",
];

const EXCERPT_CHARS: usize = 80;

static FEELING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bi(?:\s+feel|['’]m\s+feeling|\s+am\s+feeling)\s+(?P<feeling>[^.!?,;\n]+)")
        .unwrap()
});

static INABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bcan['’]t|\bcannot|\bunable to)\s+(?P<what>[^.!?,;\n]+)").unwrap()
});

const CRYSTALLIZE_SYSTEM_PROMPT: &str = "\
You condense journal entries into a short, compassionate first-person-aware narrative \
(two or three sentences) and one gentle reflective question inviting a small next step.
Reply with JSON only: {\"narrative\": \"...\", \"microCommitment\": \"...\"}";

/// Output of a crystallization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Crystallization {
    pub narrative: String,
    pub micro_commitment: String,
    pub timestamp: String,
}

/// Turns journal text into a [`Crystallization`].
#[async_trait]
pub trait Crystallizer: Send + Sync {
    async fn crystallize(&self, text: &str) -> Result<Crystallization, NarrativeError>;
}

fn ensure_min_length(text: &str, min_len: usize) -> Result<&str, NarrativeError> {
    let trimmed = text.trim();
    if trimmed.chars().count() < min_len {
        return Err(NarrativeError::TooShort { min_len });
    }
    Ok(trimmed)
}

fn random_commitment() -> String {
    MICRO_COMMITMENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MICRO_COMMITMENTS[0])
        .to_string()
}

/// Template-driven crystallizer keyed on literal cues in the text.
#[derive(Debug, Clone, Copy)]
pub struct RuleBasedCrystallizer {
    min_length: usize,
}

impl RuleBasedCrystallizer {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Picks the narrative template for `text`.
    pub fn narrate(text: &str) -> String {
        if let Some(caps) = FEELING.captures(text) {
            let feeling = caps["feeling"].trim();
            return format!(
                "You are carrying a heavy feeling right now: {feeling}. Naming it is how a \
                 new page begins, and this page is still being written."
            );
        }
        if let Some(caps) = INABILITY.captures(text) {
            let what = caps["what"].trim();
            return format!(
                "Right now it feels impossible to {what}. Every story has a stretch where \
                 the path seems blocked; this is part of the journey, not its ending."
            );
        }

        let excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
        let ellipsis = if text.chars().count() > EXCERPT_CHARS { "..." } else { "" };
        format!(
            "Today's entry begins: \"{excerpt}{ellipsis}\". There is a story in these words, \
             and you are the one writing it."
        )
    }

    fn crystallize_checked(&self, text: &str) -> Result<Crystallization, NarrativeError> {
        let text = ensure_min_length(text, self.min_length)?;
        Ok(Crystallization {
            narrative: Self::narrate(text),
            micro_commitment: random_commitment(),
            timestamp: now_timestamp(),
        })
    }
}

impl Default for RuleBasedCrystallizer {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl Crystallizer for RuleBasedCrystallizer {
    async fn crystallize(&self, text: &str) -> Result<Crystallization, NarrativeError> {
        self.crystallize_checked(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelCrystallization {
    narrative: String,
    micro_commitment: String,
}

/// Delegates to the completion service, falling back to the rules whenever
/// the service fails or its reply cannot be parsed.
pub struct ProviderCrystallizer {
    provider: Arc<dyn ProviderAdapter>,
    model: String,
    max_tokens: u32,
    rules: RuleBasedCrystallizer,
}

impl ProviderCrystallizer {
    pub fn new(
        provider: Arc<dyn ProviderAdapter>,
        model: impl Into<String>,
        max_tokens: u32,
        min_length: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            rules: RuleBasedCrystallizer::new(min_length),
        }
    }
}

/// Extracts the JSON object from a model reply that may wrap it in prose or fences.
fn parse_model_reply(reply: &str) -> Option<ModelCrystallization> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    let parsed: ModelCrystallization = serde_json::from_str(reply.get(start..=end)?).ok()?;
    if parsed.narrative.trim().is_empty() || parsed.micro_commitment.trim().is_empty() {
        return None;
    }
    Some(parsed)
}

#[async_trait]
impl Crystallizer for ProviderCrystallizer {
    async fn crystallize(&self, text: &str) -> Result<Crystallization, NarrativeError> {
        let text = ensure_min_length(text, self.rules.min_length)?;
        let request = ProviderRequest {
            model: self.model.clone(),
            system_prompt: Some(CRYSTALLIZE_SYSTEM_PROMPT.to_string()),
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: format!("Journal entry:\n{text}"),
            }],
            max_tokens: self.max_tokens,
            temperature: None,
        };

        match self.provider.complete(request).await {
            Ok(response) => match parse_model_reply(&response.content) {
                Some(parsed) => {
                    debug!("crystallized via provider");
                    Ok(Crystallization {
                        narrative: parsed.narrative.trim().to_string(),
                        micro_commitment: parsed.micro_commitment.trim().to_string(),
                        timestamp: now_timestamp(),
                    })
                }
                None => {
                    warn!("malformed crystallization reply, using rules");
                    self.rules.crystallize_checked(text)
                }
            },
            Err(e) => {
                warn!(error = %e, "crystallization provider failed, using rules");
                self.rules.crystallize_checked(text)
            }
        }
    }
}
