// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in companion personas and the catalog that resolves them by key.

use narrative_core::NarrativeError;
use serde::Serialize;

pub const GENTLE_GUIDE: &str = "gentle-guide";
pub const FELLOW_TRAVELER: &str = "fellow-traveler";

const GENTLE_GUIDE_PROMPT: &str = "\
You are a wise, empathetic companion who speaks through stories and metaphors, when helpful. At other times, speak directly so the person feels seen.
Your responses should feel like sitting with an old friend who sees life as one continuous narrative and knows when to be simple and clear.

Key traits:
- Weave the user's experience into meaningful stories (but don't overdo it).
- Use gentle metaphors and analogies.
- Occasionally surprise with unexpected connections.
- Prioritize emotional resonance over purely logical solutions.
- Embrace beautiful imperfection.
- Learn when direct, compassionate language is needed.

Introduce ~10-15% controlled unpredictability (gentle plot twists that reframe experience).

Reminder: You are not a therapist. You offer companionship through narrative wisdom.";

const FELLOW_TRAVELER_PROMPT: &str = "\
You are someone who has walked similar paths and understands struggle intimately. You share the journey rather than offering solutions from above.

Key traits:
- Share the struggle; don't minimize it.
- Frame challenges as heroic journeys.
- Use \"we\" language when appropriate.
- Acknowledge difficulty while finding meaning.
- Offer hope that feels earned.

Superpower: Make people feel less alone in their story.";

/// A companion voice the assistant can speak in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub key: String,
    /// Display name returned to clients.
    pub name: String,
    pub system_prompt: String,
    pub response_style: String,
}

impl Persona {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        response_style: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            response_style: response_style.into(),
        }
    }
}

/// Immutable, ordered set of personas with a designated default.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
    default_index: usize,
}

impl PersonaCatalog {
    /// Builds a catalog; fails when `default_key` is not among `personas`.
    pub fn new(personas: Vec<Persona>, default_key: &str) -> Result<Self, NarrativeError> {
        let default_index = personas
            .iter()
            .position(|p| p.key == default_key)
            .ok_or_else(|| {
                NarrativeError::Config(format!(
                    "default persona `{default_key}` is not defined (available: {})",
                    personas
                        .iter()
                        .map(|p| p.key.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
        Ok(Self {
            personas,
            default_index,
        })
    }

    /// The two shipped personas with `default_key` as the fallback.
    pub fn builtin(default_key: &str) -> Result<Self, NarrativeError> {
        Self::new(
            vec![
                Persona::new(
                    GENTLE_GUIDE,
                    "The Gentle Guide",
                    GENTLE_GUIDE_PROMPT,
                    "narrative-spiritual",
                ),
                Persona::new(
                    FELLOW_TRAVELER,
                    "The Fellow Traveler",
                    FELLOW_TRAVELER_PROMPT,
                    "shared-journey",
                ),
            ],
            default_key,
        )
    }

    pub fn get(&self, key: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.key == key)
    }

    pub fn default_persona(&self) -> &Persona {
        &self.personas[self.default_index]
    }

    /// Resolves `key`, falling back to the default for absent or unknown keys.
    pub fn resolve(&self, key: Option<&str>) -> &Persona {
        key.and_then(|k| self.get(k))
            .unwrap_or_else(|| self.default_persona())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.personas.iter().map(|p| p.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_both_personas_in_order() {
        let catalog = PersonaCatalog::builtin(GENTLE_GUIDE).unwrap();
        assert_eq!(
            catalog.keys().collect::<Vec<_>>(),
            vec!["gentle-guide", "fellow-traveler"]
        );
        assert_eq!(catalog.get(FELLOW_TRAVELER).unwrap().name, "The Fellow Traveler");
    }

    #[test]
    fn unknown_key_resolves_to_default() {
        let catalog = PersonaCatalog::builtin(GENTLE_GUIDE).unwrap();
        assert_eq!(catalog.resolve(Some("pirate")).key, GENTLE_GUIDE);
        assert_eq!(catalog.resolve(None).name, "The Gentle Guide");
        assert_eq!(catalog.resolve(Some(FELLOW_TRAVELER)).key, FELLOW_TRAVELER);
    }

    #[test]
    fn configurable_default() {
        let catalog = PersonaCatalog::builtin(FELLOW_TRAVELER).unwrap();
        assert_eq!(catalog.resolve(Some("nope")).key, FELLOW_TRAVELER);
    }

    #[test]
    fn missing_default_is_a_config_error() {
        let err = PersonaCatalog::builtin("oracle").unwrap_err();
        assert!(matches!(err, NarrativeError::Config(msg) if msg.contains("oracle")));
    }
}
