//! Request and agent kind enumerations.

use super::{RequestError, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind assigned to a request by the intent classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Slide deck generation.
    Presentation,
    /// Grounded question answering over documents.
    Document,
    /// Structured numeric extraction.
    Financial,
    /// Conversational answer, optionally with web search.
    Chat,
    /// No kind could be determined.
    Unclassified,
}

impl RequestKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Document => "document",
            Self::Financial => "financial",
            Self::Chat => "chat",
            Self::Unclassified => "unclassified",
        }
    }

    /// Returns the agent kind serving this request kind, if any.
    #[must_use]
    pub const fn agent_kind(self) -> Option<AgentKind> {
        match self {
            Self::Presentation => Some(AgentKind::Presentation),
            Self::Document => Some(AgentKind::Document),
            Self::Financial => Some(AgentKind::Financial),
            Self::Chat => Some(AgentKind::Chat),
            Self::Unclassified => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RequestKind {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        if normalized == "unclassified" {
            return Ok(Self::Unclassified);
        }
        AgentKind::try_from(value).map(Self::from)
    }
}

/// Closed set of agent kinds that may be registered with the dispatcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Presentation handler.
    Presentation,
    /// Document handler.
    Document,
    /// Financial handler.
    Financial,
    /// Chat handler.
    Chat,
}

impl AgentKind {
    /// Every agent kind in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Presentation,
        Self::Document,
        Self::Financial,
        Self::Chat,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Presentation => "presentation",
            Self::Document => "document",
            Self::Financial => "financial",
            Self::Chat => "chat",
        }
    }

    /// Returns the minimum caller role for requests served by this kind.
    ///
    /// Kinds that write artifacts to the object store require
    /// [`Role::WriteAccess`].
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Presentation | Self::Financial => Role::WriteAccess,
            Self::Document | Self::Chat => Role::ReadOnly,
        }
    }
}

impl From<AgentKind> for RequestKind {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Presentation => Self::Presentation,
            AgentKind::Document => Self::Document,
            AgentKind::Financial => Self::Financial,
            AgentKind::Chat => Self::Chat,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentKind {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "presentation" => Ok(Self::Presentation),
            "document" => Ok(Self::Document),
            "financial" => Ok(Self::Financial),
            "chat" => Ok(Self::Chat),
            _ => Err(RequestError::UnknownKind(value.to_owned())),
        }
    }
}
