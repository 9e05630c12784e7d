//! Validator verdicts and rejection reasons.

use crate::agent::domain::{ObjectKey, ToolName};
use crate::request::AgentKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single reason for rejecting a candidate result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// The deck has no slides.
    #[error("deck has no slides")]
    EmptyDeck,

    /// The deck exceeds the slide limit.
    #[error("deck has {count} slides, limit is {max}")]
    TooManySlides {
        /// Slides produced.
        count: u32,
        /// Configured limit.
        max: u32,
    },

    /// The artifact reference does not resolve in the object store.
    #[error("artifact {0} is not resolvable")]
    ArtifactUnresolvable(ObjectKey),

    /// A grounded answer carries no citations.
    #[error("no citations")]
    NoCitations,

    /// A required schema field is absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field value lies outside its declared range.
    #[error("field {field} value {value} is outside the declared range")]
    OutOfRange {
        /// Field name.
        field: String,
        /// Extracted value.
        value: f64,
    },

    /// The response text is empty.
    #[error("empty response text")]
    EmptyResponse,

    /// A tool failure was not compensated for.
    #[error("unresolved tool error: {tool}: {message}")]
    UnresolvedToolError {
        /// Failing tool.
        tool: ToolName,
        /// Failure description.
        message: String,
    },

    /// The handler produced a payload for a different kind.
    #[error("expected a {expected} result, got {actual}")]
    KindMismatch {
        /// Kind that was dispatched.
        expected: AgentKind,
        /// Kind of the payload returned.
        actual: AgentKind,
    },
}

impl Rejection {
    /// Returns whether another attempt may fix this rejection without new
    /// caller input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::EmptyDeck
            | Self::TooManySlides { .. }
            | Self::ArtifactUnresolvable(_)
            | Self::NoCitations
            | Self::EmptyResponse
            | Self::UnresolvedToolError { .. } => true,
            Self::MissingField(_) | Self::OutOfRange { .. } | Self::KindMismatch { .. } => false,
        }
    }

    /// Returns the reason shown to the caller.
    ///
    /// Backend messages and storage keys are left out; the full text stays
    /// in the audit trail.
    #[must_use]
    pub fn public_reason(&self) -> String {
        match self {
            Self::ArtifactUnresolvable(_) => "artifact is not resolvable".to_owned(),
            Self::UnresolvedToolError { tool, .. } => format!("unresolved tool error: {tool}"),
            other => other.to_string(),
        }
    }
}

/// Validator outcome: accept, or reject with a retryable flag and reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    accept: bool,
    retryable: bool,
    reasons: Vec<String>,
    #[serde(default)]
    public_reasons: Vec<String>,
}

impl Verdict {
    /// Creates an accepting verdict.
    #[must_use]
    pub const fn accepted() -> Self {
        Self {
            accept: true,
            retryable: false,
            reasons: Vec::new(),
            public_reasons: Vec::new(),
        }
    }

    /// Folds rejections into a verdict.
    ///
    /// No rejections accepts. Otherwise the verdict is retryable only when
    /// every rejection is retryable.
    #[must_use]
    pub fn from_rejections(rejections: &[Rejection]) -> Self {
        if rejections.is_empty() {
            return Self::accepted();
        }
        Self {
            accept: false,
            retryable: rejections.iter().all(Rejection::is_retryable),
            reasons: rejections.iter().map(ToString::to_string).collect(),
            public_reasons: rejections.iter().map(Rejection::public_reason).collect(),
        }
    }

    /// Returns whether the candidate was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        self.accept
    }

    /// Returns whether a rejected candidate may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Returns human-readable rejection reasons.
    #[must_use]
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    /// Returns rejection reasons safe to show the caller.
    #[must_use]
    pub fn public_reasons(&self) -> &[String] {
        &self.public_reasons
    }
}
