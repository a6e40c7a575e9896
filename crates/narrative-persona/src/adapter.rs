// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona prompt adaptation.
//!
//! Combines a base persona, the stored profile and the conversation history
//! into an ordered list of labeled prompt sections. The safety section is
//! tagged [`Priority::Override`] so callers can verify it is present and
//! positioned ahead of the closing principles.

use narrative_core::types::{
    AgeRange, ChatMessage, DetectedPatterns, MessageLength, Role, UserProfile,
};
use strum::Display;

use crate::catalog::Persona;
use crate::safety;
use crate::style;

const CORE_PRINCIPLES: &str = "\
CORE PRINCIPLES:
1) Treat this person as a unique individual, not a demographic category.
2) Match their language complexity and style.
3) Use examples from THEIR world and interests when available.
4) For children, keep language simple and concrete without being patronizing.
5) If they mention specific interests, weave those into your responses.
6) Be genuinely curious about their experiences; reflect, don't lecture.";

/// Topic cues scanned in user messages and the insight each one yields.
const TOPIC_CUES: &[(&[&str], &str)] = &[
    (&["school", "class"], "school/academic context"),
    (&["friend"], "friendships and social relationships"),
    (&["family"], "family dynamics"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SectionLabel {
    Persona,
    UserContext,
    Insights,
    SafetyOverride,
    CorePrinciples,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Normal,
    /// Takes precedence over every other section.
    Override,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    pub label: SectionLabel,
    pub priority: Priority,
    pub text: String,
}

impl PromptSection {
    fn normal(label: SectionLabel, text: impl Into<String>) -> Self {
        Self {
            label,
            priority: Priority::Normal,
            text: text.into(),
        }
    }
}

/// The assembled instruction prompt, still in structured form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptedPrompt {
    pub sections: Vec<PromptSection>,
}

impl AdaptedPrompt {
    pub fn section(&self, label: SectionLabel) -> Option<&PromptSection> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Joins the sections with blank lines, in order.
    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Result of adapting a persona to one user and one history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adaptation {
    pub prompt: AdaptedPrompt,
    /// Patterns derived from the history, for the caller to persist.
    pub patterns: DetectedPatterns,
    /// Whether the latest user message tripped the crisis trigger.
    pub crisis_detected: bool,
}

/// Builds adapted prompts. Holds only the analysis window size.
#[derive(Debug, Clone, Copy)]
pub struct PersonaAdapter {
    style_window: usize,
}

impl Default for PersonaAdapter {
    fn default() -> Self {
        Self { style_window: 3 }
    }
}

impl PersonaAdapter {
    pub fn new(style_window: usize) -> Self {
        Self { style_window }
    }

    pub fn adapt(
        &self,
        persona: &Persona,
        profile: &UserProfile,
        history: &[ChatMessage],
    ) -> Adaptation {
        let latest_user = history.iter().rev().find(|m| m.role == Role::User);
        let crisis_detected = latest_user.is_some_and(|m| safety::detect_crisis(&m.content));
        if crisis_detected {
            tracing::warn!(user_id = %profile.user_id, "crisis indicators in latest message");
        }

        let sections = vec![
            PromptSection::normal(SectionLabel::Persona, persona.system_prompt.clone()),
            PromptSection::normal(SectionLabel::UserContext, self.user_context(profile, history)),
            PromptSection::normal(SectionLabel::Insights, conversation_insights(history)),
            PromptSection {
                label: SectionLabel::SafetyOverride,
                priority: Priority::Override,
                text: safety::protocol_text(crisis_detected),
            },
            PromptSection::normal(SectionLabel::CorePrinciples, CORE_PRINCIPLES),
        ];

        Adaptation {
            prompt: AdaptedPrompt { sections },
            patterns: DetectedPatterns {
                typical_message_length: latest_user.map(|m| message_length(&m.content)),
                ..Default::default()
            },
            crisis_detected,
        }
    }

    fn user_context(&self, profile: &UserProfile, history: &[ChatMessage]) -> String {
        let age = match profile.age_range {
            Some(range) => match age_hint(range) {
                Some(hint) => format!("{range} ({hint})"),
                None => range.to_string(),
            },
            None => "unknown".to_string(),
        };
        let interests = if profile.interests.is_empty() {
            "none".to_string()
        } else {
            profile.interests.join(", ")
        };
        let start = history.len().saturating_sub(self.style_window);
        let style = style::analyze(&history[start..]).describe();

        format!(
            "INDIVIDUAL USER CONTEXT:\n\
             - Age range: {age}\n\
             - Communication preferences: {}\n\
             - Stated interests: {interests}\n\
             - Preferred interaction style: {}\n\
             - User communication style: {style}",
            profile.communication_style, profile.preferred_interaction_style,
        )
    }
}

fn age_hint(range: AgeRange) -> Option<&'static str> {
    match range {
        AgeRange::Child => Some(
            "Use simple, concrete language. Short sentences. Relatable examples from their world.",
        ),
        AgeRange::Teen => Some("Be authentic and non-patronizing. Take them seriously."),
        AgeRange::YoungAdult => Some("Peer-level support. Growth-focused."),
        AgeRange::Adult => Some("Mature, nuanced responses. Complex metaphors are okay."),
        AgeRange::PreferNotToSay => None,
    }
}

fn conversation_insights(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "CONVERSATION INSIGHTS:\n- New conversation. Be curious about their world."
            .to_string();
    }

    let lowered: Vec<String> = history
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.to_lowercase())
        .collect();
    let topics: Vec<&str> = TOPIC_CUES
        .iter()
        .filter(|(cues, _)| {
            lowered
                .iter()
                .any(|text| cues.iter().any(|cue| text.contains(cue)))
        })
        .map(|(_, topic)| *topic)
        .collect();

    let mut out = String::from("CONVERSATION INSIGHTS:\n");
    if !topics.is_empty() {
        out.push_str(&format!("- Topics they raise: {}\n", topics.join(", ")));
    }
    out.push_str("- Build on what they actually bring up, not assumptions.");
    out
}

fn message_length(content: &str) -> MessageLength {
    match content.chars().count() {
        n if n < 50 => MessageLength::Short,
        n if n < 150 => MessageLength::Medium,
        _ => MessageLength::Long,
    }
}
