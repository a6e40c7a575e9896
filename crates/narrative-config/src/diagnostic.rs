// SPDX-FileCopyrightText: 2026 Narrative Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment failures into miette reports.
//!
//! Unknown keys get a labelled span in the offending file and, when a known
//! key is close enough by Jaro-Winkler distance, a suggested correction.

#![allow(unused_assignments)] // emitted by the miette derive

use figment::error::{Error as FigmentError, Kind};
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

const MIN_SIMILARITY: f64 = 0.75;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(narrative::config::unknown_key))]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        #[help]
        hint: String,
        #[label("not a key of this section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(narrative::config::wrong_type), help("expected {expected}"))]
    WrongType {
        key: String,
        found: String,
        expected: String,
    },

    #[error("`{key}` is required")]
    #[diagnostic(code(narrative::config::missing_key))]
    MissingKey { key: String },

    /// A value parsed but is out of range or otherwise unusable.
    #[error("invalid setting: {message}")]
    #[diagnostic(code(narrative::config::validation))]
    Validation { message: String },

    #[error("{0}")]
    #[diagnostic(code(narrative::config::other))]
    Other(String),
}

/// One diagnostic per error carried by `err`.
///
/// `texts` holds `(name, content)` for each TOML text that was read, so an
/// unknown key can be pointed at in its file.
pub fn figment_to_config_errors(err: FigmentError, texts: &[(String, String)]) -> Vec<ConfigError> {
    err.into_iter().map(|e| convert(&e, texts)).collect()
}

fn convert(error: &FigmentError, texts: &[(String, String)]) -> ConfigError {
    let dotted = || error.path.join(".");
    match &error.kind {
        Kind::UnknownField(key, known) => {
            let suggestion = suggest_key(key, *known);
            let hint = match &suggestion {
                Some(s) => format!("did you mean `{s}`? Known keys: {}", known.join(", ")),
                None => format!("known keys: {}", known.join(", ")),
            };
            let (span, src) = match source_text(error, texts) {
                Some((name, content)) => match find_key_offset(content, &error.path, key) {
                    Some(at) => (
                        Some(SourceSpan::new(at.into(), key.len())),
                        Some(NamedSource::new(name, content.to_string())),
                    ),
                    None => (None, None),
                },
                None => (None, None),
            };
            ConfigError::UnknownKey {
                key: key.clone(),
                suggestion,
                hint,
                span,
                src,
            }
        }
        Kind::InvalidType(found, expected) => ConfigError::WrongType {
            key: dotted(),
            found: found.to_string(),
            expected: expected.clone(),
        },
        Kind::MissingField(key) => ConfigError::MissingKey {
            key: key.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// The text of the file `error` was raised for, if it is one we read.
fn source_text<'a>(
    error: &FigmentError,
    texts: &'a [(String, String)],
) -> Option<(&'a str, &'a str)> {
    let figment::Source::File(path) = error.metadata.as_ref()?.source.as_ref()? else {
        return None;
    };
    let wanted = path.display().to_string();
    texts
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(name, content)| (name.as_str(), content.as_str()))
}

/// Byte offset of `key` within the `[section]` named by `path[0]`.
///
/// An empty `path` searches the whole text. A key only matches when followed
/// by whitespace or `=`, so `host` does not match `hostname`.
pub fn find_key_offset(content: &str, path: &[String], key: &str) -> Option<usize> {
    let body_start = match path.first() {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut line_start = body_start;
    for line in content[body_start..].split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            return None;
        }
        if let Some(after) = trimmed.strip_prefix(key)
            && after.starts_with([' ', '\t', '='])
        {
            return Some(line_start + (line.len() - trimmed.len()));
        }
        line_start += line.len();
    }
    None
}

/// Closest key in `known`, if any clears the similarity floor.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, known: &[S]) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for candidate in known.iter().map(AsRef::as_ref) {
        let score = strsim::jaro_winkler(unknown, candidate);
        if score > MIN_SIMILARITY && best.is_none_or(|(top, _)| score > top) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, key)| key.to_string())
}

/// Prints every error to stderr as a miette report.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("config error: {error}"),
        }
    }
}
