//! Shared capability interface implemented by every agent handler.

use super::{BackendError, StorageError};
use crate::agent::domain::{AgentCapabilities, CandidateResult, Escalation, InvocationContext};
use crate::request::AgentKind;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for handler invocations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that abort a single handler invocation.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// A backend call failed and no best-effort result could be composed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Artifact storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Prompt rendering failed.
    #[error("prompt rendering failed: {0}")]
    Prompt(String),

    /// A generated artifact could not be encoded.
    #[error("artifact encoding failed: {0}")]
    Encoding(String),

    /// The request was cancelled mid-invocation.
    #[error("invocation cancelled")]
    Cancelled,
}

/// Agent handler contract.
///
/// Handlers are stateless between invocations: everything an attempt needs
/// arrives through the [`InvocationContext`].
#[async_trait]
pub trait AgentHandler: Send + Sync {
    /// Returns the kind this handler serves.
    fn kind(&self) -> AgentKind;

    /// Returns the declared capabilities and latency bound.
    fn capabilities(&self) -> &AgentCapabilities;

    /// Turns a classified request into a candidate result.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the invocation cannot produce any
    /// candidate, not even a degraded one.
    async fn invoke(&self, context: &InvocationContext<'_>) -> AgentResult<CandidateResult>;

    /// Adjusts parameters for the next attempt after a retryable rejection
    /// or failed attempt.
    ///
    /// The default retries with unchanged parameters.
    fn escalate(&self, current: &Escalation, _reasons: &[String]) -> Escalation {
        current.next_level()
    }
}
