//! Individual validation rule implementations.
//!
//! Each rule is a pure function over part of a candidate result. Rules
//! return `Ok(())` or the [`Rejection`] describing the violation.

use std::collections::BTreeMap;

use crate::agent::domain::{CandidateResult, Citation, SlideManifest};
use crate::config::FinancialSchema;
use crate::request::{AgentKind, RequestMode};
use crate::validation::Rejection;

/// Validates `0 < slide_count <= max_slides`.
///
/// # Errors
///
/// Returns [`Rejection::EmptyDeck`] or [`Rejection::TooManySlides`].
pub const fn check_slide_count(manifest: &SlideManifest, max_slides: u32) -> Result<(), Rejection> {
    if manifest.slide_count == 0 {
        return Err(Rejection::EmptyDeck);
    }
    if manifest.slide_count > max_slides {
        return Err(Rejection::TooManySlides {
            count: manifest.slide_count,
            max: max_slides,
        });
    }
    Ok(())
}

/// Validates that grounded answers cite at least one source.
///
/// # Errors
///
/// Returns [`Rejection::NoCitations`] for an uncited grounded answer.
pub const fn check_citations(citations: &[Citation], mode: RequestMode) -> Result<(), Rejection> {
    match mode {
        RequestMode::Grounded if citations.is_empty() => Err(Rejection::NoCitations),
        RequestMode::Grounded | RequestMode::Freeform => Ok(()),
    }
}

/// Validates extracted fields against `schema`, reporting every violation.
#[must_use]
pub fn check_financial_fields(
    fields: &BTreeMap<String, f64>,
    schema: &FinancialSchema,
) -> Vec<Rejection> {
    let mut rejections = Vec::new();
    for spec in &schema.fields {
        match fields.get(&spec.name) {
            None if spec.required => rejections.push(Rejection::MissingField(spec.name.clone())),
            None => {}
            Some(value) if !spec.contains(*value) => rejections.push(Rejection::OutOfRange {
                field: spec.name.clone(),
                value: *value,
            }),
            Some(_) => {}
        }
    }
    rejections
}

/// Validates that response text is not blank.
///
/// # Errors
///
/// Returns [`Rejection::EmptyResponse`] for blank text.
pub fn check_response_text(text: &str) -> Result<(), Rejection> {
    if text.trim().is_empty() {
        return Err(Rejection::EmptyResponse);
    }
    Ok(())
}

/// Reports every unresolved tool failure.
#[must_use]
pub fn check_tool_failures(result: &CandidateResult) -> Vec<Rejection> {
    result
        .tool_failures()
        .iter()
        .filter(|failure| !failure.resolved)
        .map(|failure| Rejection::UnresolvedToolError {
            tool: failure.tool,
            message: failure.message.clone(),
        })
        .collect()
}

/// Validates that the payload matches the dispatched kind.
///
/// # Errors
///
/// Returns [`Rejection::KindMismatch`] when it does not.
pub fn check_kind(result: &CandidateResult, expected: AgentKind) -> Result<(), Rejection> {
    let actual = result.agent_kind();
    if actual == expected {
        Ok(())
    } else {
        Err(Rejection::KindMismatch { expected, actual })
    }
}
