//! Per-attempt invocation records owned by a dispatcher execution.

use super::DispatchDomainError;
use crate::request::{AgentKind, InvocationId, RequestId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    /// The handler is running.
    Pending,
    /// The validator accepted the candidate.
    Succeeded,
    /// The handler failed, timed out, or was cancelled.
    Failed,
    /// The validator rejected the candidate.
    Rejected,
}

impl InvocationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for InvocationStatus {
    type Error = DispatchDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "rejected" => Ok(Self::Rejected),
            other => Err(DispatchDomainError::UnknownInvocationStatus(
                other.to_owned(),
            )),
        }
    }
}

/// One attempt at producing a result for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvocation {
    id: InvocationId,
    request_id: RequestId,
    agent_kind: AgentKind,
    attempt_number: u32,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: InvocationStatus,
    result_ref: Option<String>,
    validator_feedback: Option<Vec<String>>,
}

impl AgentInvocation {
    /// Starts a pending invocation.
    #[must_use]
    pub fn start(
        request_id: RequestId,
        agent_kind: AgentKind,
        attempt_number: u32,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: InvocationId::new(),
            request_id,
            agent_kind,
            attempt_number,
            started_at: clock.utc(),
            finished_at: None,
            status: InvocationStatus::Pending,
            result_ref: None,
            validator_feedback: None,
        }
    }

    /// Marks the invocation accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvocationFinished`] when the
    /// invocation is no longer pending.
    pub fn succeed(
        &mut self,
        result_ref: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        self.finish(InvocationStatus::Succeeded, clock)?;
        self.result_ref = result_ref;
        Ok(())
    }

    /// Marks the invocation failed with a diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvocationFinished`] when the
    /// invocation is no longer pending.
    pub fn fail(
        &mut self,
        detail: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        self.finish(InvocationStatus::Failed, clock)?;
        self.validator_feedback = Some(vec![detail.into()]);
        Ok(())
    }

    /// Marks the invocation rejected by the validator.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvocationFinished`] when the
    /// invocation is no longer pending.
    pub fn reject(
        &mut self,
        result_ref: Option<String>,
        reasons: Vec<String>,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        self.finish(InvocationStatus::Rejected, clock)?;
        self.result_ref = result_ref;
        self.validator_feedback = Some(reasons);
        Ok(())
    }

    fn finish(
        &mut self,
        status: InvocationStatus,
        clock: &impl Clock,
    ) -> Result<(), DispatchDomainError> {
        if self.status != InvocationStatus::Pending {
            return Err(DispatchDomainError::InvocationFinished(
                self.attempt_number,
            ));
        }
        self.status = status;
        self.finished_at = Some(clock.utc());
        Ok(())
    }

    /// Returns the invocation identifier.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the owning request.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the invoked handler kind.
    #[must_use]
    pub const fn agent_kind(&self) -> AgentKind {
        self.agent_kind
    }

    /// Returns the 1-based attempt number.
    #[must_use]
    pub const fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// Returns when the attempt started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the attempt finished, if it has.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> InvocationStatus {
        self.status
    }

    /// Returns the opaque result reference.
    #[must_use]
    pub fn result_ref(&self) -> Option<&str> {
        self.result_ref.as_deref()
    }

    /// Returns validator or failure feedback.
    #[must_use]
    pub fn validator_feedback(&self) -> Option<&[String]> {
        self.validator_feedback.as_deref()
    }
}
