//! Deterministic keyword rules for intent classification.
//!
//! Rules are pure functions of the input text and attachment content types.
//! Presentation indicators win over financial indicators, which win over
//! document indicators; text matching none of them is a low-confidence chat.

use crate::classification::domain::{Confidence, IntentAssessment, IntentInput};
use crate::request::RequestKind;

const PRESENTATION_INDICATORS: &[&str] = &[
    "presentation",
    "powerpoint",
    "ppt",
    "slides",
    "slide",
    "deck",
    "make slides",
    "generate presentation",
];

const FINANCIAL_INDICATORS: &[&str] = &[
    "extract",
    "loan portfolio",
    "balance sheet",
    "income statement",
    "net interest margin",
    "non-performing",
    "portfolio yield",
    "financial statement",
];

const DOCUMENT_INDICATORS: &[&str] = &[
    "document",
    "file",
    "uploaded",
    "attachment",
    "what did i upload",
    "analyze the file",
    "tell me about",
    "summarize",
    "explain the document",
];

const CURRENT_INFORMATION_INDICATORS: &[&str] = &[
    "current",
    "latest",
    "recent",
    "news",
    "today",
    "yesterday",
    "this week",
    "this month",
    "this year",
    "now",
    "search",
    "find information",
    "what happened",
    "what is happening",
    "stock price",
    "weather",
    "trending",
];

/// Vocabulary marking a request as financial in nature.
pub const FINANCIAL_VOCABULARY: &[&str] = &[
    "financial",
    "finance",
    "loan",
    "portfolio",
    "revenue",
    "earnings",
    "margin",
    "balance sheet",
    "quarterly",
    "q1",
    "q2",
    "q3",
    "q4",
];

const SPREADSHEET_TYPES: &[&str] = &[
    "text/csv",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

const SINGLE_MATCH: Confidence = Confidence::saturating(0.7);
const MULTIPLE_MATCHES: Confidence = Confidence::saturating(0.9);
const ATTACHMENT_ONLY: Confidence = Confidence::saturating(0.55);
const NO_MATCH: Confidence = Confidence::saturating(0.4);

/// Lowercases `text` and reduces it to space-delimited words so indicators
/// match on word boundaries only.
fn normalize(text: &str) -> String {
    let words: Vec<String> = text
        .to_lowercase()
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '-'))
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();
    format!(" {} ", words.join(" "))
}

/// Returns the indicators from `indicators` found in normalized `text`.
fn matches<'a>(text: &str, indicators: &[&'a str]) -> Vec<&'a str> {
    indicators
        .iter()
        .copied()
        .filter(|indicator| text.contains(&format!(" {indicator} ")))
        .collect()
}

fn confidence_for(match_count: usize) -> Confidence {
    if match_count > 1 {
        MULTIPLE_MATCHES
    } else {
        SINGLE_MATCH
    }
}

fn assessment(kind: RequestKind, found: &[&str]) -> IntentAssessment {
    IntentAssessment::new(
        kind,
        confidence_for(found.len()),
        format!("matched {} indicators: {}", kind, found.join(", ")),
    )
}

/// Classifies `input` using keyword rules.
///
/// # Examples
///
/// ```
/// use scriptorium::classification::{domain::IntentInput, rules};
/// use scriptorium::request::RequestKind;
///
/// let input = IntentInput::new("create a 10 slide deck about Q2 results", Vec::<String>::new());
/// assert_eq!(rules::classify(&input).kind, RequestKind::Presentation);
/// ```
#[must_use]
pub fn classify(input: &IntentInput) -> IntentAssessment {
    let text = normalize(input.text());

    let presentation = matches(&text, PRESENTATION_INDICATORS);
    if !presentation.is_empty() {
        return assessment(RequestKind::Presentation, &presentation);
    }
    let financial = matches(&text, FINANCIAL_INDICATORS);
    if !financial.is_empty() {
        return assessment(RequestKind::Financial, &financial);
    }
    let document = matches(&text, DOCUMENT_INDICATORS);
    if !document.is_empty() {
        return assessment(RequestKind::Document, &document);
    }
    if !input.content_types().is_empty() {
        return IntentAssessment::new(
            RequestKind::Document,
            ATTACHMENT_ONLY,
            "attachments present without explicit indicators",
        );
    }
    IntentAssessment::new(RequestKind::Chat, NO_MATCH, "no indicators matched")
}

/// Scores how strongly `text` asks for current, time-sensitive information.
#[must_use]
pub fn needs_current_information(text: &str) -> Confidence {
    let lowered = normalize(text);
    match matches(&lowered, CURRENT_INFORMATION_INDICATORS).len() {
        0 => Confidence::NONE,
        1 => Confidence::saturating(0.6),
        _ => Confidence::saturating(0.9),
    }
}

/// Returns whether `text` or the attachment types suggest financial content.
#[must_use]
pub fn is_financial(text: &str, content_types: &[&str]) -> bool {
    let lowered = normalize(text);
    !matches(&lowered, FINANCIAL_VOCABULARY).is_empty()
        || content_types
            .iter()
            .any(|content_type| SPREADSHEET_TYPES.contains(content_type))
}
