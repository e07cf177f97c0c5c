// SPDX-License-Identifier: MIT

//! Grammar correction collaborator and an offline implementation

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::error::Error;

/// Text-to-text grammar corrector.
///
/// Returns `Ok(None)` when no correction is produced.
#[async_trait]
pub trait GrammarCorrector: Send + Sync {
    async fn correct(&self, text: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>>;
}

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+([,.;:!?])").unwrap());
static LONE_I: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(^|[\s"(])i([\s,;:!?')’]|$)"#).unwrap());
static SENTENCE_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(^\s*["“]?|[.!?]["”]?\s+["“]?)([a-z])"#).unwrap());

/// Words whose doubling is grammatical ("she had had enough")
const ALLOWED_DOUBLES: [&str; 2] = ["had", "that"];

/// Rule-based corrector that needs no network or model
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalGrammar;

impl LocalGrammar {
    pub fn new() -> Self {
        Self
    }

    /// Apply every rule, in order, to the text
    pub fn apply(&self, text: &str) -> String {
        let mut out = HORIZONTAL_WS.replace_all(text, " ").into_owned();
        out = SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned();
        out = collapse_repeated_words(&out);
        // Run twice so adjacent matches sharing a delimiter are both caught
        for _ in 0..2 {
            out = LONE_I.replace_all(&out, "${1}I${2}").into_owned();
        }
        out = SENTENCE_START
            .replace_all(&out, |caps: &Captures| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned();
        out
    }
}

#[async_trait]
impl GrammarCorrector for LocalGrammar {
    async fn correct(&self, text: &str) -> Result<Option<String>, Box<dyn Error + Send + Sync>> {
        let corrected = self.apply(text);
        if corrected == text {
            Ok(None)
        } else {
            Ok(Some(corrected))
        }
    }
}

/// Drop a word that repeats the word right before it ("the the" -> "the").
///
/// Only words separated by a single space are considered so that line
/// breaks and punctuation keep their meaning ("no. No" is left alone).
fn collapse_repeated_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_word: Option<&str> = None;

    for (i, segment) in text.split(' ').enumerate() {
        let is_word = !segment.is_empty() && segment.chars().all(|c| c.is_alphabetic());
        if let (true, Some(prev)) = (is_word, prev_word) {
            if prev.eq_ignore_ascii_case(segment) && !is_allowed_double(segment) {
                continue;
            }
        }
        if i > 0 {
            out.push(' ');
        }
        out.push_str(segment);
        prev_word = if is_word {
            Some(segment)
        } else {
            trailing_word(segment)
        };
    }

    out
}

fn is_allowed_double(word: &str) -> bool {
    ALLOWED_DOUBLES.iter().any(|w| w.eq_ignore_ascii_case(word))
}

/// The last word of a segment if it ends in letters (e.g. "\nthe" -> "the")
fn trailing_word(segment: &str) -> Option<&str> {
    let start = segment
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_alphabetic())
        .last()
        .map(|(i, _)| i)?;
    // Ignore words glued to punctuation like "end." or "(the"
    let before = segment[..start].chars().last();
    match before {
        Some(c) if c.is_whitespace() => Some(&segment[start..]),
        _ => None,
    }
}
