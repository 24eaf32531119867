//! Feedback normalization.
//!
//! Stored feedback is the provider's raw payload. This module derives the
//! structured view on read: a JSON payload is decoded first, anything else
//! falls back to the labelled plain-text layout, and a transcript, when
//! present, is scanned for customer answers. Normalization never fails.
pub mod transcript;

pub use transcript::{scan_customer_responses, CustomerResponses, QuestionKey};

use serde::Serialize;
use serde_json::{Map, Value};

/// Which decoder produced a [`ParsedFeedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackSource {
    Structured,
    PlainText,
    #[default]
    Empty,
}

/// Call length as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CallDuration {
    Seconds(f64),
    /// Free text from a plain-text `Duration:` section that is not a number.
    Text(String),
}

impl CallDuration {
    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        match text.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Some(Self::Seconds(seconds)),
            _ => Some(Self::Text(text.to_string())),
        }
    }

    pub fn display(&self) -> String {
        match self {
            CallDuration::Seconds(seconds) => format_duration(*seconds),
            CallDuration::Text(text) => text.clone(),
        }
    }
}

/// Structured summary derived from a raw feedback payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedFeedback {
    pub source: FeedbackSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<CallDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Free-form `Feedback:` section of a plain-text payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub customer_responses: CustomerResponses,
}

impl ParsedFeedback {
    /// True when no field could be recovered.
    pub fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.transcript.is_none()
            && self.duration.is_none()
            && self.ended_reason.is_none()
            && self.status.is_none()
            && self.feedback.is_none()
            && self.customer_responses.is_empty()
    }
}

/// Derive a [`ParsedFeedback`] from a raw payload.
pub fn normalize(raw: Option<&str>) -> ParsedFeedback {
    let Some(text) = raw.filter(|text| !text.trim().is_empty()) else {
        return ParsedFeedback::default();
    };
    let mut parsed = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => from_structured(&fields),
        _ => from_plain_text(text),
    };
    if let Some(transcript) = parsed.transcript.as_deref() {
        parsed.customer_responses = scan_customer_responses(transcript);
    }
    parsed
}

fn from_structured(fields: &Map<String, Value>) -> ParsedFeedback {
    let summary = non_empty_str(fields.get("summary")).or_else(|| {
        fields
            .get("analysis")
            .and_then(|analysis| non_empty_str(analysis.get("summary")))
    });
    let duration = match fields.get("duration") {
        Some(Value::Number(number)) => number.as_f64().map(CallDuration::Seconds),
        Some(Value::String(text)) => CallDuration::from_text(text),
        _ => None,
    };
    ParsedFeedback {
        source: FeedbackSource::Structured,
        summary,
        transcript: non_empty_str(fields.get("transcript")),
        duration,
        ended_reason: non_empty_str(fields.get("endedReason"))
            .or_else(|| non_empty_str(fields.get("ended_reason"))),
        status: non_empty_str(fields.get("status")),
        feedback: None,
        customer_responses: CustomerResponses::new(),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Clone, Copy)]
enum Section {
    Summary,
    Feedback,
    Transcript,
    Duration,
    Ended,
}

const SECTION_LABELS: [(&str, Section); 5] = [
    ("Summary:", Section::Summary),
    ("Feedback:", Section::Feedback),
    ("Transcript:", Section::Transcript),
    ("Duration:", Section::Duration),
    ("Ended:", Section::Ended),
];

fn from_plain_text(text: &str) -> ParsedFeedback {
    let mut parsed = ParsedFeedback {
        source: FeedbackSource::PlainText,
        ..ParsedFeedback::default()
    };
    let text = text.replace("\r\n", "\n");
    for block in text.split("\n\n") {
        let block = block.trim_start();
        let Some((section, value)) = SECTION_LABELS.iter().find_map(|(label, section)| {
            block.strip_prefix(label).map(|rest| (*section, rest.trim()))
        }) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        let value = value.to_string();
        match section {
            Section::Summary => parsed.summary = Some(value),
            Section::Feedback => parsed.feedback = Some(value),
            Section::Transcript => parsed.transcript = Some(value),
            Section::Duration => parsed.duration = CallDuration::from_text(&value),
            Section::Ended => parsed.ended_reason = Some(value),
        }
    }
    if parsed.is_empty() {
        parsed.source = FeedbackSource::Empty;
    }
    parsed
}

const PREVIEW_MAX_CHARS: usize = 50;

/// One-line summary used in the lead table.
pub fn preview(raw: Option<&str>) -> String {
    let parsed = normalize(raw);
    match parsed.source {
        FeedbackSource::Structured if parsed.transcript.is_none() => {
            "Feedback available".to_string()
        }
        FeedbackSource::Structured => parsed
            .customer_responses
            .get(&QuestionKey::Satisfaction)
            .cloned()
            .unwrap_or_else(|| "Conversation completed".to_string()),
        FeedbackSource::PlainText | FeedbackSource::Empty => {
            let text = raw.map(str::trim).unwrap_or_default();
            if text.is_empty() {
                return "No feedback yet".to_string();
            }
            let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if flat.chars().count() > PREVIEW_MAX_CHARS {
                format!("{}...", crate::util::truncate_chars(&flat, PREVIEW_MAX_CHARS))
            } else {
                flat
            }
        }
    }
}

/// Render seconds as `m:ss`, dropping fractional seconds.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod tests;
