// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona adaptation for the Narrative journaling assistant.
//!
//! Pure building blocks used by the conversation engine:
//! - [`emotion`]: keyword mood and theme extraction
//! - [`style`]: length and tone analysis over recent user messages
//! - [`catalog`]: the built-in personas
//! - [`adapter`]: layered prompt assembly with a safety override section

pub mod adapter;
pub mod catalog;
pub mod emotion;
pub mod safety;
pub mod style;

pub use adapter::{
    AdaptedPrompt, Adaptation, PersonaAdapter, Priority, PromptSection, SectionLabel,
};
pub use catalog::{Persona, PersonaCatalog};
pub use emotion::{EmotionSignal, extract};
pub use style::{LengthBucket, StyleProfile, Tone};
