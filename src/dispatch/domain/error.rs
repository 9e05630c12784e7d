//! Dispatch domain errors and the pipeline error taxonomy.

use super::PipelineState;
use crate::request::{AgentKind, RequestKind, Role};
use thiserror::Error;

/// Errors raised by dispatch domain invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchDomainError {
    /// The state machine does not permit the move.
    #[error("invalid pipeline transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: PipelineState,
        /// Requested state.
        to: PipelineState,
    },

    /// A stored state string is not recognised.
    #[error("unknown pipeline state: {0}")]
    UnknownState(String),

    /// An invocation status string is not recognised.
    #[error("unknown invocation status: {0}")]
    UnknownInvocationStatus(String),

    /// The invocation has already finished.
    #[error("invocation attempt {0} has already finished")]
    InvocationFinished(u32),
}

/// Failure taxonomy of the request pipeline.
///
/// Only [`PipelineError::public_reason`] crosses the external boundary;
/// the `Display` text may carry internal detail and is for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The classifier backend failed; the pipeline degraded to chat.
    #[error("classification degraded: {0}")]
    Classification(String),

    /// No handler is registered or supported for the kind.
    #[error("unsupported kind: {0}")]
    UnsupportedKind(RequestKind),

    /// A handler invocation failed or timed out.
    #[error("agent invocation failed for {kind}: {detail}")]
    AgentInvocation {
        /// Kind of the failing handler.
        kind: AgentKind,
        /// Failure detail.
        detail: String,
    },

    /// The validator rejected the candidate.
    #[error("validation rejected the result: {}", reasons.join("; "))]
    ValidationRejection {
        /// Whether another attempt may help.
        retryable: bool,
        /// Rejection reasons, including backend detail.
        reasons: Vec<String>,
        /// Rejection reasons safe to show the caller.
        public_reasons: Vec<String>,
    },

    /// An audit write failed and was queued for reconciliation.
    #[error("audit write failed: {0}")]
    AuditWrite(String),

    /// Artifact storage failed during an invocation.
    #[error("artifact storage failed: {0}")]
    Storage(String),

    /// The caller's role does not permit the request.
    #[error("role {held} does not permit {kind} requests")]
    Unauthorized {
        /// Role held by the caller.
        held: Role,
        /// Requested kind.
        kind: AgentKind,
    },

    /// The request was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The overall request deadline elapsed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl PipelineError {
    /// Returns whether the dispatcher may retry after this error.
    ///
    /// Storage failures count as retryable invocation failures.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::AgentInvocation { .. } | Self::Storage(_) => true,
            Self::ValidationRejection { retryable, .. } => *retryable,
            Self::Classification(_)
            | Self::UnsupportedKind(_)
            | Self::AuditWrite(_)
            | Self::Unauthorized { .. }
            | Self::Cancelled
            | Self::DeadlineExceeded => false,
        }
    }

    /// Returns reasons safe to show the caller.
    #[must_use]
    pub fn public_reasons(&self) -> Vec<String> {
        match self {
            Self::Classification(_) => vec!["request could not be classified".to_owned()],
            Self::UnsupportedKind(_) => vec!["unsupported kind".to_owned()],
            Self::AgentInvocation { .. } => vec!["agent invocation failed".to_owned()],
            Self::ValidationRejection { public_reasons, .. } => public_reasons.clone(),
            Self::AuditWrite(_) => vec!["audit-degraded".to_owned()],
            Self::Storage(_) => vec!["artifact storage failed".to_owned()],
            Self::Unauthorized { .. } => vec!["insufficient role".to_owned()],
            Self::Cancelled => vec!["request cancelled".to_owned()],
            Self::DeadlineExceeded => vec!["request deadline exceeded".to_owned()],
        }
    }
}
