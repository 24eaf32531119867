//! Best-effort recovery of customer answers from a call transcript.
//!
//! The scan is a single top-to-bottom pass holding one pending-question slot.
//! An `AI:` line that reads like one of the known questions fills the slot;
//! the next `User:` line answers it and empties the slot. Matching is plain
//! substring search and depends on line order. It is approximate on purpose
//! and should not be made smarter without product input.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic questions the calling assistant asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    Satisfaction,
    Helpful,
    Suggestions,
    FutureInterest,
}

impl QuestionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKey::Satisfaction => "satisfaction",
            QuestionKey::Helpful => "helpful",
            QuestionKey::Suggestions => "suggestions",
            QuestionKey::FutureInterest => "future_interest",
        }
    }

    /// Heading shown next to the answer in the feedback view.
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKey::Satisfaction => "Service Rating",
            QuestionKey::Helpful => "What Was Helpful",
            QuestionKey::Suggestions => "Suggestions",
            QuestionKey::FutureInterest => "Future Services Interest",
        }
    }
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type CustomerResponses = BTreeMap<QuestionKey, String>;

#[derive(Debug, PartialEq, Eq)]
enum Turn<'a> {
    Assistant(&'a str),
    Customer(&'a str),
    Other,
}

fn split_turn(line: &str) -> Turn<'_> {
    let line = line.trim_start();
    if let Some(text) = line.strip_prefix("AI:") {
        Turn::Assistant(text.trim())
    } else if let Some(text) = line.strip_prefix("User:") {
        Turn::Customer(text.trim())
    } else {
        Turn::Other
    }
}

/// Map an assistant line to the question it asks, if any.
///
/// Rules are checked in order; the first hit wins.
pub fn classify_question(text: &str) -> Option<QuestionKey> {
    let lower = text.to_lowercase();
    if lower.contains("how satisfied") || lower.contains("rate it") {
        Some(QuestionKey::Satisfaction)
    } else if lower.contains("especially helpful") || lower.contains("impressive") {
        Some(QuestionKey::Helpful)
    } else if lower.contains("suggestions") || lower.contains("improve") {
        Some(QuestionKey::Suggestions)
    } else if lower.contains("interested in") && lower.contains("future") {
        Some(QuestionKey::FutureInterest)
    } else {
        None
    }
}

#[derive(Default)]
struct Scanner {
    pending: Option<QuestionKey>,
    responses: CustomerResponses,
}

impl Scanner {
    fn feed(&mut self, line: &str) {
        match split_turn(line) {
            Turn::Assistant(text) => {
                // Unrecognized assistant lines keep the current question open.
                if let Some(key) = classify_question(text) {
                    self.pending = Some(key);
                }
            }
            Turn::Customer(answer) => {
                let Some(key) = self.pending.take() else {
                    return;
                };
                if !answer.is_empty() {
                    self.responses.entry(key).or_insert_with(|| answer.to_string());
                }
            }
            Turn::Other => {}
        }
    }
}

/// Recover answers to the known questions from a speaker-tagged transcript.
pub fn scan_customer_responses(transcript: &str) -> CustomerResponses {
    let mut scanner = Scanner::default();
    for line in transcript.lines() {
        scanner.feed(line);
    }
    scanner.responses
}
