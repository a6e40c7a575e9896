// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-based emotion signal extraction.

use narrative_core::types::Mood;

/// Emotion labels and their trigger substrings, in precedence order.
const EMOTION_TABLE: &[(Mood, &[&str])] = &[
    (Mood::Sad, &["sad", "depressed", "down", "hopeless", "empty", "lost"]),
    (
        Mood::Anxious,
        &["worried", "scared", "anxious", "nervous", "panic", "afraid"],
    ),
    (
        Mood::Angry,
        &["angry", "frustrated", "mad", "irritated", "furious"],
    ),
    (
        Mood::Hopeful,
        &["better", "improving", "hopeful", "optimistic", "good"],
    ),
    (
        Mood::Confused,
        &["confused", "uncertain", "unclear", "wondering"],
    ),
];

/// Mood and theme tags detected in a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmotionSignal {
    /// First matching label in table order, or [`Mood::Neutral`].
    pub mood: Mood,
    /// Every matching label, in table order.
    pub themes: Vec<Mood>,
}

/// Extracts the emotion signal from `message` by case-insensitive substring match.
pub fn extract(message: &str) -> EmotionSignal {
    let lower = message.to_lowercase();
    let themes: Vec<Mood> = EMOTION_TABLE
        .iter()
        .filter(|(_, triggers)| triggers.iter().any(|t| lower.contains(t)))
        .map(|(mood, _)| *mood)
        .collect();

    EmotionSignal {
        mood: themes.first().copied().unwrap_or_default(),
        themes,
    }
}
