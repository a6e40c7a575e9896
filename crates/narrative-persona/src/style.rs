// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Communication style analysis over recent user messages.

use narrative_core::types::{ChatMessage, Role};
use strum::Display;

const CASUAL_MARKERS: &[&str] = &["lol", "omg", "tbh", "ngl", "fr", "btw", "!!", "???"];
const FORMAL_MARKERS: &[&str] = &["however", "therefore", "furthermore", "consequently"];

/// Average message length bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LengthBucket {
    Unknown,
    Short,
    Medium,
    LongMedium,
    Long,
}

impl LengthBucket {
    fn from_average(avg: f64) -> Self {
        if avg < 30.0 {
            Self::Short
        } else if avg < 80.0 {
            Self::Medium
        } else if avg < 150.0 {
            Self::LongMedium
        } else {
            Self::Long
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            Self::Unknown => "unknown - adapt as you learn",
            Self::Short => "very short messages - keep responses brief and simple",
            Self::Medium => "short to medium messages - moderate complexity okay",
            Self::LongMedium => "medium messages - can handle more complex responses",
            Self::Long => "longer messages - comfortable with detailed responses",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Tone {
    Casual,
    Formal,
    Moderate,
}

/// Style descriptors derived from a window of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleProfile {
    pub bucket: LengthBucket,
    pub tone: Tone,
}

impl StyleProfile {
    /// Human-readable hint placed in the user-context prompt section.
    pub fn describe(&self) -> String {
        match self.bucket {
            LengthBucket::Unknown => self.bucket.guidance().to_string(),
            bucket => format!("{}; {} tone", bucket.guidance(), self.tone),
        }
    }
}

/// Analyzes the user-authored messages in `window`.
///
/// Callers pass the trailing slice of history they want considered; assistant
/// messages inside it are ignored.
pub fn analyze(window: &[ChatMessage]) -> StyleProfile {
    let user_messages: Vec<&ChatMessage> =
        window.iter().filter(|m| m.role == Role::User).collect();
    if user_messages.is_empty() {
        return StyleProfile {
            bucket: LengthBucket::Unknown,
            tone: Tone::Moderate,
        };
    }

    let total_chars: usize = user_messages.iter().map(|m| m.content.chars().count()).sum();
    let avg = total_chars as f64 / user_messages.len() as f64;

    let (mut casual, mut formal) = (0usize, 0usize);
    for message in &user_messages {
        let lower = message.content.to_lowercase();
        casual += CASUAL_MARKERS.iter().filter(|m| lower.contains(*m)).count();
        formal += FORMAL_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    }
    let tone = match casual.cmp(&formal) {
        std::cmp::Ordering::Greater => Tone::Casual,
        std::cmp::Ordering::Less => Tone::Formal,
        std::cmp::Ordering::Equal => Tone::Moderate,
    };

    StyleProfile {
        bucket: LengthBucket::from_average(avg),
        tone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_is_unknown_and_moderate() {
        let profile = analyze(&[]);
        assert_eq!(profile.bucket, LengthBucket::Unknown);
        assert_eq!(profile.tone, Tone::Moderate);
        assert_eq!(profile.describe(), "unknown - adapt as you learn");
    }

    #[test]
    fn assistant_messages_are_ignored() {
        let window = vec![
            ChatMessage::user("ok"),
            ChatMessage::assistant(&"a".repeat(400)),
        ];
        assert_eq!(analyze(&window).bucket, LengthBucket::Short);
    }

    #[test]
    fn bucket_boundaries() {
        let at = |n: usize| analyze(&[ChatMessage::user("a".repeat(n))]).bucket;
        assert_eq!(at(29), LengthBucket::Short);
        assert_eq!(at(30), LengthBucket::Medium);
        assert_eq!(at(79), LengthBucket::Medium);
        assert_eq!(at(80), LengthBucket::LongMedium);
        assert_eq!(at(149), LengthBucket::LongMedium);
        assert_eq!(at(150), LengthBucket::Long);
    }

    #[test]
    fn casual_markers_win_majority() {
        let window = vec![
            ChatMessage::user("omg tbh today was wild lol"),
            ChatMessage::user("however it ended ok"),
        ];
        let profile = analyze(&window);
        assert_eq!(profile.tone, Tone::Casual);
        assert_eq!(
            profile.describe(),
            "very short messages - keep responses brief and simple; casual tone"
        );
    }

    #[test]
    fn formal_markers_win_majority() {
        let window = vec![ChatMessage::user(
            "I tried; however, it did not work. Therefore I stopped.",
        )];
        assert_eq!(analyze(&window).tone, Tone::Formal);
    }

    #[test]
    fn tie_is_moderate() {
        let window = vec![ChatMessage::user("lol, however")];
        assert_eq!(analyze(&window).tone, Tone::Moderate);
    }
}
