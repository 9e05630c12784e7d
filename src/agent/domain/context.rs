//! Per-invocation context passed to handlers.

use super::Escalation;
use crate::classification::domain::ClassificationResult;
use crate::request::Request;
use tokio_util::sync::CancellationToken;

/// Everything a handler may read during one attempt.
///
/// Handlers must not retain the context beyond the invocation.
#[derive(Debug, Clone)]
pub struct InvocationContext<'a> {
    request: &'a Request,
    classification: &'a ClassificationResult,
    attempt: u32,
    escalation: &'a Escalation,
    cancel: CancellationToken,
}

impl<'a> InvocationContext<'a> {
    /// Creates a context for attempt number `attempt` (1-based).
    #[must_use]
    pub const fn new(
        request: &'a Request,
        classification: &'a ClassificationResult,
        attempt: u32,
        escalation: &'a Escalation,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            request,
            classification,
            attempt,
            escalation,
            cancel,
        }
    }

    /// Returns the request being served.
    #[must_use]
    pub const fn request(&self) -> &'a Request {
        self.request
    }

    /// Returns the classification of the request.
    #[must_use]
    pub const fn classification(&self) -> &'a ClassificationResult {
        self.classification
    }

    /// Returns the 1-based attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the escalation parameters for this attempt.
    #[must_use]
    pub const fn escalation(&self) -> &'a Escalation {
        self.escalation
    }

    /// Returns the request cancellation token.
    #[must_use]
    pub const fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}
