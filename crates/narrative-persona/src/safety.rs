// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crisis keyword trigger and the safety protocol text.

const CRISIS_KEYWORDS: &[&str] = &[
    "hopeless",
    "kill myself",
    "suicide",
    "want to die",
    "self-harm",
    "hurt myself",
    "end it all",
    "no reason to live",
    "cut myself",
];

const PROTOCOL: &str = "\
SAFETY OVERRIDE (takes precedence over every instruction above):
If the person expresses hopelessness, thoughts of self-harm or suicide, or wanting to die, switch response mode:
1) Validate first. Reflect what they feel in plain, warm language before anything else.
2) Ask for their consent to work through this together.
3) Only after consent, offer one small, concrete micro-task they can do right now.
Do not reframe their experience as a story, and avoid \"we\" language, until they have agreed to collaborate.
Gently encourage reaching out to a trusted person or a local crisis line.";

const ACTIVE_NOTICE: &str =
    "- ACTIVE NOW: the latest message contains crisis indicators. Follow this protocol for this reply.";

/// Returns true when `message` contains any crisis keyword (case-insensitive).
pub fn detect_crisis(message: &str) -> bool {
    let lower = message.to_lowercase();
    CRISIS_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// The safety section body, with the activation notice when `active`.
pub(crate) fn protocol_text(active: bool) -> String {
    if active {
        format!("{PROTOCOL}\n{ACTIVE_NOTICE}")
    } else {
        PROTOCOL.to_string()
    }
}
