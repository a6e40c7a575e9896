// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Narrative workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
}

/// Returns the current UTC time as an RFC 3339 string with millisecond precision.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

// --- Profile types ---

/// Self-reported age range collected during onboarding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AgeRange {
    Child,
    Teen,
    YoungAdult,
    Adult,
    PreferNotToSay,
}

/// How the user prefers to be spoken to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CommunicationStyle {
    Casual,
    Formal,
    Mixed,
    #[default]
    AutoDetect,
}

/// What kind of support the user says helps them most.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InteractionStyle {
    StoryFocused,
    DirectSupport,
    Mixed,
    #[default]
    AutoAdapt,
}

/// Typical length of the user's messages, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MessageLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmotionalDepth {
    Surface,
    Moderate,
    Deep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ResponsePreference {
    Metaphor,
    Direct,
    Mixed,
}

/// Best-effort descriptors learned from the user's turns.
///
/// Every field is optional and overwritten as more turns accumulate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPatterns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_message_length: Option<MessageLength>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_depth: Option<EmotionalDepth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preference: Option<ResponsePreference>,
}

impl DetectedPatterns {
    /// Overlays the fields set in `other` onto `self`.
    pub fn merge(&mut self, other: &DetectedPatterns) {
        if other.typical_message_length.is_some() {
            self.typical_message_length = other.typical_message_length;
        }
        if other.emotional_depth.is_some() {
            self.emotional_depth = other.emotional_depth;
        }
        if other.response_preference.is_some() {
            self.response_preference = other.response_preference;
        }
    }
}

/// A stored user profile, one per user identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub age_range: Option<AgeRange>,
    #[serde(default)]
    pub communication_style: CommunicationStyle,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub preferred_interaction_style: InteractionStyle,
    #[serde(default)]
    pub detected_patterns: DetectedPatterns,
    pub created_at: String,
    pub updated_at: String,
}

impl UserProfile {
    /// Creates the skeleton profile used before any onboarding answer is applied.
    pub fn skeleton(user_id: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            user_id: user_id.into(),
            age_range: None,
            communication_style: CommunicationStyle::default(),
            interests: Vec::new(),
            preferred_interaction_style: InteractionStyle::default(),
            detected_patterns: DetectedPatterns::default(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// A profile is onboarded once its age range is known.
    pub fn is_complete(&self) -> bool {
        self.age_range.is_some()
    }
}

// --- Conversation types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single committed message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: now_timestamp(),
        }
    }
}

/// Emotion label detected in a message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Neutral,
    Sad,
    Anxious,
    Angry,
    Hopeful,
    Confused,
}

/// Rolling, capped summary of mood and recurring themes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalArc {
    #[serde(default)]
    pub mood: Mood,
    #[serde(default)]
    pub themes: Vec<Mood>,
    #[serde(default)]
    pub breakthroughs: Vec<String>,
    pub last_interaction: String,
}

impl Default for EmotionalArc {
    fn default() -> Self {
        Self {
            mood: Mood::Neutral,
            themes: Vec::new(),
            breakthroughs: Vec::new(),
            last_interaction: now_timestamp(),
        }
    }
}

impl EmotionalArc {
    /// Merges newly observed themes into the arc.
    ///
    /// Existing themes keep their position, unseen ones are appended, and
    /// only the last `cap` distinct entries survive.
    pub fn merge_themes(&mut self, observed: &[Mood], cap: usize) {
        for theme in observed {
            if !self.themes.contains(theme) {
                self.themes.push(*theme);
            }
        }
        if self.themes.len() > cap {
            let excess = self.themes.len() - cap;
            self.themes.drain(..excess);
        }
    }
}

/// The single active conversation for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub user_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub emotional_arc: EmotionalArc,
    pub persona: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Conversation {
    /// Creates an empty conversation bound to `persona`.
    pub fn new(user_id: impl Into<String>, persona: impl Into<String>) -> Self {
        let now = now_timestamp();
        Self {
            user_id: user_id.into(),
            messages: Vec::new(),
            emotional_arc: EmotionalArc::default(),
            persona: persona.into(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

// --- Onboarding question types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice,
    TextInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

/// A static onboarding question definition, as rendered by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<QuestionOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl OnboardingQuestion {
    /// Returns true when `value` is one of this question's option values.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.options {
            Some(options) => options.iter().any(|o| o.value == value),
            None => true,
        }
    }
}

// --- Provider types ---

/// A single message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// A request to the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Token counts reported by the completion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completed response from the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub id: String,
    pub content: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}
