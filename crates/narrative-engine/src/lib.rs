// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Narrative journaling assistant.
//!
//! The [`ConversationEngine`] is the central coordinator that:
//! - Gates chat on a completed onboarding profile
//! - Tracks the emotional arc of each conversation
//! - Adapts the persona prompt and calls the completion service
//! - Commits each successful turn atomically
//!
//! Onboarding sequencing lives in [`onboarding`], crystallization in
//! [`crystallizer`].

pub mod conversation;
pub mod crystallizer;
pub mod locks;
pub mod onboarding;
pub mod shutdown;

pub use conversation::{ConversationEngine, EngineSettings, TurnOutcome, TurnReply};
pub use crystallizer::{
    Crystallization, Crystallizer, ProviderCrystallizer, RuleBasedCrystallizer,
};
pub use onboarding::{OnboardingFlow, ProfileField, RawAnswer, StepOutcome};
