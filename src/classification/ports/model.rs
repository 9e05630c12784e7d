//! Model-based classification fallback port.

use crate::classification::domain::{IntentAssessment, IntentInput};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for intent model calls.
pub type IntentModelResult<T> = Result<T, IntentModelError>;

/// Model consulted when keyword rules are not confident enough.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IntentModel: Send + Sync {
    /// Assesses the intent of `input`.
    ///
    /// # Errors
    ///
    /// Returns [`IntentModelError`] when the backend is unreachable or
    /// answers with something that cannot be interpreted.
    async fn assess(&self, input: &IntentInput) -> IntentModelResult<IntentAssessment>;
}

/// Errors returned by intent model implementations.
#[derive(Debug, Clone, Error)]
pub enum IntentModelError {
    /// The backend could not be reached.
    #[error("intent model unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an unusable payload.
    #[error("intent model returned a malformed answer: {0}")]
    Malformed(String),

    /// Transport-level failure.
    #[error("intent model transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl IntentModelError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
