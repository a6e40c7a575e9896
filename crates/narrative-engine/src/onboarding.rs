// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Onboarding flow: an ordered sequence of profile-collection steps.
//!
//! Step `N` is addressed as `stepN`. Each step carries the profile field it writes.

use std::str::FromStr;

use narrative_core::types::{
    OnboardingQuestion, QuestionKind, QuestionOption, UserProfile, now_timestamp,
};
use narrative_core::{NarrativeError, StorageAdapter};
use tracing::{debug, info};

/// The profile field an onboarding step writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    AgeRange,
    CommunicationStyle,
    Interests,
    PreferredInteractionStyle,
}

#[derive(Debug, Clone)]
pub struct OnboardingStep {
    pub target: ProfileField,
    pub question: OnboardingQuestion,
}

/// An answer as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnswer {
    Missing,
    Text(String),
    List(Vec<String>),
}

/// Where the user stands after an answer was applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub next_step: Option<u32>,
    pub next_question: Option<OnboardingQuestion>,
    pub completed: bool,
}

/// Immutable onboarding step catalog.
#[derive(Debug, Clone)]
pub struct OnboardingFlow {
    steps: Vec<OnboardingStep>,
}

impl OnboardingFlow {
    pub fn new(steps: Vec<OnboardingStep>) -> Self {
        Self { steps }
    }

    /// The four shipped steps: age range, communication style, interests,
    /// preferred interaction style.
    pub fn builtin() -> Self {
        Self::new(vec![
            OnboardingStep {
                target: ProfileField::AgeRange,
                question: single_choice(
                    "To help me connect with you better, what age range best fits you?",
                    &[
                        ("child", "Under 13"),
                        ("teen", "13-17"),
                        ("young-adult", "18-25"),
                        ("adult", "26+"),
                        ("prefer-not-to-say", "I'd rather not say"),
                    ],
                ),
            },
            OnboardingStep {
                target: ProfileField::CommunicationStyle,
                question: single_choice(
                    "How do you usually like to communicate?",
                    &[
                        ("casual", "Casual and relaxed (like texting a friend)"),
                        ("formal", "More formal and structured"),
                        ("mixed", "It depends on my mood"),
                        ("auto-detect", "Just match how I write to you"),
                    ],
                ),
            },
            OnboardingStep {
                target: ProfileField::Interests,
                question: OnboardingQuestion {
                    question: "What are some things you enjoy or find interesting? \
                               (This helps me choose better examples and stories)"
                        .to_string(),
                    options: None,
                    placeholder: Some("Music, sports, books, games, science, art...".to_string()),
                    kind: QuestionKind::TextInput,
                    optional: Some(true),
                },
            },
            OnboardingStep {
                target: ProfileField::PreferredInteractionStyle,
                question: single_choice(
                    "When you're looking for support, what usually helps you most?",
                    &[
                        (
                            "story-focused",
                            "Stories and metaphors that help me see things differently",
                        ),
                        ("direct-support", "Direct, clear understanding and validation"),
                        ("mixed", "A combination of both"),
                        ("auto-adapt", "Whatever feels right in the moment"),
                    ],
                ),
            },
        ])
    }

    fn step(&self, step: u32) -> Option<&OnboardingStep> {
        let index = usize::try_from(step).ok()?.checked_sub(1)?;
        self.steps.get(index)
    }

    pub fn question(&self, step: u32) -> Option<&OnboardingQuestion> {
        self.step(step).map(|s| &s.question)
    }

    /// Looks a question up by its `stepN` key.
    pub fn question_by_key(&self, key: &str) -> Option<&OnboardingQuestion> {
        parse_step_key(key).and_then(|n| self.question(n))
    }

    pub fn has_next_step(&self, step: u32) -> bool {
        step.checked_add(1)
            .is_some_and(|next| self.step(next).is_some())
    }

    /// Every question keyed `step1..stepN`, in order.
    pub fn questions(&self) -> Vec<(String, &OnboardingQuestion)> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, s)| (step_key(i as u32 + 1), &s.question))
            .collect()
    }

    /// Validates `answer` for `step`, applies it to the user's profile
    /// (creating a skeleton if needed) and stores the result.
    ///
    /// Callers must serialize submissions per user.
    pub async fn submit_answer(
        &self,
        storage: &dyn StorageAdapter,
        user_id: &str,
        step: u32,
        answer: RawAnswer,
    ) -> Result<StepOutcome, NarrativeError> {
        let definition = self.step(step).ok_or_else(|| NarrativeError::InvalidStep {
            step: step_key(step),
        })?;

        let mut profile = match storage.get_profile(user_id).await? {
            Some(profile) => profile,
            None => {
                info!(user_id = %user_id, "creating profile skeleton");
                UserProfile::skeleton(user_id)
            }
        };
        apply(definition, &mut profile, answer)?;
        profile.updated_at = now_timestamp();
        storage.upsert_profile(&profile).await?;
        debug!(user_id = %user_id, step, field = ?definition.target, "onboarding answer stored");

        if !self.has_next_step(step) {
            info!(user_id = %user_id, "onboarding complete");
            return Ok(StepOutcome {
                next_step: None,
                next_question: None,
                completed: true,
            });
        }
        let next = step + 1;
        Ok(StepOutcome {
            next_step: Some(next),
            next_question: self.question(next).cloned(),
            completed: false,
        })
    }
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::builtin()
    }
}

pub fn step_key(step: u32) -> String {
    format!("step{step}")
}

/// Parses `stepN` or a bare `N`.
pub fn parse_step_key(key: &str) -> Option<u32> {
    let key = key.trim();
    key.strip_prefix("step").unwrap_or(key).parse().ok()
}

fn single_choice(question: &str, options: &[(&str, &str)]) -> OnboardingQuestion {
    OnboardingQuestion {
        question: question.to_string(),
        options: Some(
            options
                .iter()
                .map(|(value, label)| QuestionOption {
                    value: value.to_string(),
                    label: label.to_string(),
                })
                .collect(),
        ),
        placeholder: None,
        kind: QuestionKind::SingleChoice,
        optional: None,
    }
}

fn apply(
    step: &OnboardingStep,
    profile: &mut UserProfile,
    answer: RawAnswer,
) -> Result<(), NarrativeError> {
    match step.target {
        ProfileField::AgeRange => profile.age_range = Some(choice(step, answer)?),
        ProfileField::CommunicationStyle => profile.communication_style = choice(step, answer)?,
        ProfileField::PreferredInteractionStyle => {
            profile.preferred_interaction_style = choice(step, answer)?
        }
        ProfileField::Interests => profile.interests = normalize_interests(answer),
    }
    Ok(())
}

fn choice<T: FromStr>(step: &OnboardingStep, answer: RawAnswer) -> Result<T, NarrativeError> {
    let invalid = || {
        let allowed: Vec<&str> = step
            .question
            .options
            .iter()
            .flatten()
            .map(|o| o.value.as_str())
            .collect();
        NarrativeError::Validation(format!(
            "Invalid response: expected one of {}",
            allowed.join(", ")
        ))
    };

    let RawAnswer::Text(value) = answer else {
        return Err(invalid());
    };
    let value = value.trim();
    if !step.question.accepts(value) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

fn normalize_interests(answer: RawAnswer) -> Vec<String> {
    let items: Vec<String> = match answer {
        RawAnswer::Missing => Vec::new(),
        RawAnswer::Text(text) => text.split(',').map(str::to_string).collect(),
        RawAnswer::List(list) => list,
    };

    let mut interests: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !interests.iter().any(|i| i == item) {
            interests.push(item.to_string());
        }
    }
    interests
}
