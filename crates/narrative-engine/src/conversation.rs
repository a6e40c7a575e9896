// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation engine: one chat turn from request to committed state.
//!
//! A turn runs under the user's lock and works on a buffered copy of the
//! conversation. Storage is only written after the completion service has
//! produced a usable reply, and then in a single transaction.

use std::sync::Arc;
use std::time::Duration;

use narrative_config::model::NarrativeConfig;
use narrative_core::types::{
    ChatMessage, Conversation, EmotionalArc, OnboardingQuestion, ProviderMessage,
    ProviderRequest, now_timestamp,
};
use narrative_core::{NarrativeError, ProviderAdapter, StorageAdapter};
use narrative_persona::{PersonaAdapter, PersonaCatalog, emotion};
use tracing::{debug, info, warn};

use crate::locks::UserLocks;
use crate::onboarding::{OnboardingFlow, RawAnswer, StepOutcome};

/// Tunables for a turn, usually taken from [`NarrativeConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Trailing messages quoted into the completion prompt.
    pub history_window: usize,
    pub style_window: usize,
    pub theme_cap: usize,
    pub turn_timeout: Duration,
}

impl EngineSettings {
    pub fn from_config(config: &NarrativeConfig) -> Self {
        Self {
            model: config.anthropic.default_model.clone(),
            max_tokens: config.anthropic.max_tokens,
            temperature: config.anthropic.temperature,
            history_window: config.engine.history_window,
            style_window: config.engine.style_window,
            theme_cap: config.engine.theme_cap,
            turn_timeout: Duration::from_secs(config.engine.turn_timeout_secs),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&NarrativeConfig::default())
    }
}

/// A successful chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub reply: String,
    pub emotional_arc: EmotionalArc,
    /// Display name of the conversation's persona.
    pub persona_name: String,
    /// The profile's age range, or `unknown`.
    pub user_age: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The user has not finished onboarding; nothing was stored.
    NeedsOnboarding {
        step: u32,
        question: OnboardingQuestion,
    },
    Reply(TurnReply),
}

pub struct ConversationEngine {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
    personas: PersonaCatalog,
    onboarding: OnboardingFlow,
    adapter: PersonaAdapter,
    locks: UserLocks,
    settings: EngineSettings,
}

impl ConversationEngine {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        personas: PersonaCatalog,
        onboarding: OnboardingFlow,
        settings: EngineSettings,
    ) -> Self {
        Self {
            storage,
            provider,
            personas,
            onboarding,
            adapter: PersonaAdapter::new(settings.style_window),
            locks: UserLocks::new(),
            settings,
        }
    }

    pub fn personas(&self) -> &PersonaCatalog {
        &self.personas
    }

    pub fn onboarding(&self) -> &OnboardingFlow {
        &self.onboarding
    }

    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Runs one chat turn for `user_id`.
    ///
    /// # Errors
    ///
    /// - [`NarrativeError::Validation`] for a blank message or user id.
    /// - [`NarrativeError::Generation`] when the completion fails, times out
    ///   or comes back empty. Nothing is stored in that case.
    /// - [`NarrativeError::Storage`] from the store.
    pub async fn handle_turn(
        &self,
        user_id: &str,
        message: &str,
        persona_key: Option<&str>,
    ) -> Result<TurnOutcome, NarrativeError> {
        if user_id.trim().is_empty() || message.trim().is_empty() {
            return Err(NarrativeError::Validation(
                "Message and userId are required".to_string(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;

        let profile = match self.storage.get_profile(user_id).await? {
            Some(profile) if profile.is_complete() => profile,
            _ => {
                debug!(user_id = %user_id, "chat before onboarding completed");
                let question = self.onboarding.question(1).cloned().ok_or_else(|| {
                    NarrativeError::Internal("onboarding flow has no first step".to_string())
                })?;
                return Ok(TurnOutcome::NeedsOnboarding { step: 1, question });
            }
        };

        let mut conversation = match self.storage.get_conversation(user_id).await? {
            Some(existing) => {
                if let Some(requested) = persona_key
                    && requested != existing.persona
                {
                    debug!(
                        user_id = %user_id,
                        persona = %existing.persona,
                        requested = %requested,
                        "ignoring persona change for existing conversation"
                    );
                }
                existing
            }
            None => {
                let persona = self.personas.resolve(persona_key);
                info!(user_id = %user_id, persona = %persona.key, "starting conversation");
                Conversation::new(user_id, persona.key.clone())
            }
        };

        let signal = emotion::extract(message);
        let arc = &mut conversation.emotional_arc;
        arc.mood = signal.mood;
        arc.merge_themes(&signal.themes, self.settings.theme_cap);
        arc.last_interaction = now_timestamp();
        conversation.messages.push(ChatMessage::user(message));

        let persona = self.personas.resolve(Some(conversation.persona.as_str()));
        let adaptation = self
            .adapter
            .adapt(persona, &profile, &conversation.messages);
        let prompt = completion_prompt(
            &adaptation.prompt.render(),
            &conversation,
            message,
            self.settings.history_window,
        );

        let reply = self.generate(prompt).await.inspect_err(|e| {
            warn!(user_id = %user_id, error = %e, "turn failed, nothing committed");
        })?;

        conversation.messages.push(ChatMessage::assistant(reply.clone()));
        conversation.updated_at = now_timestamp();
        self.storage
            .commit_turn(&conversation, &adaptation.patterns)
            .await?;
        info!(
            user_id = %user_id,
            persona = %persona.key,
            mood = %conversation.emotional_arc.mood,
            messages = conversation.messages.len(),
            "turn committed"
        );

        Ok(TurnOutcome::Reply(TurnReply {
            reply,
            emotional_arc: conversation.emotional_arc,
            persona_name: persona.name.clone(),
            user_age: profile
                .age_range
                .map_or_else(|| "unknown".to_string(), |a| a.to_string()),
        }))
    }

    async fn generate(&self, prompt: String) -> Result<String, NarrativeError> {
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
        };

        let duration = self.settings.turn_timeout;
        let response = match tokio::time::timeout(duration, self.provider.complete(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.into_generation()),
            Err(_) => return Err(NarrativeError::Timeout { duration }.into_generation()),
        };

        let text = response.content.trim();
        if text.is_empty() {
            return Err(NarrativeError::Generation {
                message: "completion service returned an empty reply".to_string(),
                source: None,
            });
        }
        Ok(text.to_string())
    }

    /// Applies an onboarding answer under the user's lock.
    pub async fn submit_onboarding_answer(
        &self,
        user_id: &str,
        step: u32,
        answer: RawAnswer,
    ) -> Result<StepOutcome, NarrativeError> {
        if user_id.trim().is_empty() {
            return Err(NarrativeError::Validation(
                "userId and step are required".to_string(),
            ));
        }
        let _guard = self.locks.acquire(user_id).await;
        self.onboarding
            .submit_answer(self.storage.as_ref(), user_id, step, answer)
            .await
    }

    /// The last `turns` stored messages as `role: content` lines, if any.
    pub async fn recent_transcript(
        &self,
        user_id: &str,
        turns: usize,
    ) -> Result<Option<String>, NarrativeError> {
        let Some(conversation) = self.storage.get_conversation(user_id).await? else {
            return Ok(None);
        };
        if conversation.messages.is_empty() {
            return Ok(None);
        }
        Ok(Some(transcript(&conversation.messages, turns)))
    }
}

fn transcript(messages: &[ChatMessage], window: usize) -> String {
    let start = messages.len().saturating_sub(window);
    messages[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assembles the single prompt sent to the completion service.
fn completion_prompt(
    adapted: &str,
    conversation: &Conversation,
    message: &str,
    window: usize,
) -> String {
    let recent = transcript(&conversation.messages, window);
    let recent = if recent.is_empty() {
        "(no prior messages yet)".to_string()
    } else {
        recent
    };
    let arc = &conversation.emotional_arc;
    let themes = if arc.themes.is_empty() {
        "exploring life".to_string()
    } else {
        arc.themes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "{adapted}\n\n\
         Recent conversation:\n{recent}\n\n\
         Emotional themes so far: {themes}\n\n\
         User's current mood: {mood}\n\n\
         Now respond to: \"{message}\"",
        mood = arc.mood,
    )
}
