//! Classification inputs and outcomes.

use super::Confidence;
use crate::request::{Request, RequestId, RequestKind};
use serde::{Deserialize, Serialize};

/// Classifier input derived from a request.
///
/// Only the instructions and attachment content types influence the
/// outcome, so identical inputs always classify identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentInput {
    text: String,
    content_types: Vec<String>,
}

impl IntentInput {
    /// Creates classifier input from raw parts.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        content_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            text: text.into(),
            content_types: content_types.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds classifier input from a request.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self::new(request.instructions(), request.content_types())
    }

    /// Returns the instruction text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the attachment content types.
    #[must_use]
    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }
}

/// Kind decision with its confidence, as produced by rules or a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentAssessment {
    /// Assessed kind.
    pub kind: RequestKind,
    /// Confidence in the assessed kind.
    pub confidence: Confidence,
    /// Short human-readable explanation.
    pub rationale: String,
}

impl IntentAssessment {
    /// Creates an assessment.
    #[must_use]
    pub fn new(kind: RequestKind, confidence: Confidence, rationale: impl Into<String>) -> Self {
        Self {
            kind,
            confidence,
            rationale: rationale.into(),
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    request_id: RequestId,
    kind: RequestKind,
    confidence: Confidence,
    rationale: String,
    needs_current_information: Confidence,
    degraded: bool,
}

impl ClassificationResult {
    /// Creates a classification result from an assessment.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        assessment: IntentAssessment,
        needs_current_information: Confidence,
    ) -> Self {
        Self {
            request_id,
            kind: assessment.kind,
            confidence: assessment.confidence,
            rationale: assessment.rationale,
            needs_current_information,
            degraded: false,
        }
    }

    /// Creates the fallback result used when the classifier backend fails.
    #[must_use]
    pub fn degraded(
        request_id: RequestId,
        reason: impl Into<String>,
        needs_current_information: Confidence,
    ) -> Self {
        Self {
            request_id,
            kind: RequestKind::Chat,
            confidence: Confidence::DEGRADED,
            rationale: reason.into(),
            needs_current_information,
            degraded: true,
        }
    }

    /// Returns the classified request identifier.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the assigned kind.
    #[must_use]
    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Returns the confidence in the assigned kind.
    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Returns the rationale.
    #[must_use]
    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    /// Returns the confidence that the request needs current information.
    #[must_use]
    pub const fn needs_current_information(&self) -> Confidence {
        self.needs_current_information
    }

    /// Returns whether the classifier fell back after a backend failure.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }
}
