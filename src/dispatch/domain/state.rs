//! Pipeline states and the transition relation between them.

use super::DispatchDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of one request in the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// The request has been created.
    Received,
    /// The request kind is known.
    Classified,
    /// A handler has been selected.
    AgentSelected,
    /// A handler invocation is in flight.
    Invoking,
    /// A candidate result is being validated.
    Validating,
    /// Another attempt will run.
    Retrying,
    /// Retries are abandoned; the request will fail.
    Escalated,
    /// A candidate result was accepted. Terminal.
    Accepted,
    /// The request failed. Terminal.
    Failed,
}

impl PipelineState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Classified => "classified",
            Self::AgentSelected => "agent_selected",
            Self::Invoking => "invoking",
            Self::Validating => "validating",
            Self::Retrying => "retrying",
            Self::Escalated => "escalated",
            Self::Accepted => "accepted",
            Self::Failed => "failed",
        }
    }

    /// Returns whether the state is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Failed)
    }

    /// Returns whether the pipeline may move from this state to `target`.
    ///
    /// Every non-terminal state may fail directly, which covers
    /// cancellation, unsupported kinds, and insufficient roles.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Received => matches!(target, Self::Classified | Self::Failed),
            Self::Classified => matches!(target, Self::AgentSelected | Self::Failed),
            Self::AgentSelected => matches!(target, Self::Invoking | Self::Failed),
            Self::Invoking => matches!(
                target,
                Self::Validating | Self::Retrying | Self::Escalated | Self::Failed
            ),
            Self::Validating => matches!(
                target,
                Self::Accepted | Self::Retrying | Self::Escalated | Self::Failed
            ),
            Self::Retrying => matches!(target, Self::Invoking | Self::Failed),
            Self::Escalated => matches!(target, Self::Failed),
            Self::Accepted | Self::Failed => false,
        }
    }

    /// Validates the move to `target` and returns the transition.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidTransition`] when the move is
    /// not permitted.
    pub const fn transition(self, target: Self) -> Result<Transition, DispatchDomainError> {
        if self.can_transition_to(target) {
            Ok(Transition {
                from: self,
                to: target,
            })
        } else {
            Err(DispatchDomainError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PipelineState {
    type Error = DispatchDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "received" => Ok(Self::Received),
            "classified" => Ok(Self::Classified),
            "agent_selected" => Ok(Self::AgentSelected),
            "invoking" => Ok(Self::Invoking),
            "validating" => Ok(Self::Validating),
            "retrying" => Ok(Self::Retrying),
            "escalated" => Ok(Self::Escalated),
            "accepted" => Ok(Self::Accepted),
            "failed" => Ok(Self::Failed),
            other => Err(DispatchDomainError::UnknownState(other.to_owned())),
        }
    }
}

/// A permitted move between two pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    from: PipelineState,
    to: PipelineState,
}

impl Transition {
    /// Returns the source state.
    #[must_use]
    pub const fn source(self) -> PipelineState {
        self.from
    }

    /// Returns the target state.
    #[must_use]
    pub const fn target(self) -> PipelineState {
        self.to
    }

    /// Returns the transition label, `{from}_to_{to}`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{}_to_{}", self.from, self.to)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
