//! Candidate results returned by agent handlers.

use super::{ObjectKey, ToolName};
use crate::request::AgentKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Layout family chosen for a generated deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateClass {
    /// Financial reporting layout.
    Financial,
    /// General-purpose layout.
    Standard,
}

impl TemplateClass {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Financial => "financial",
            Self::Standard => "standard",
        }
    }
}

/// Structural summary of a generated deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideManifest {
    /// Number of slides.
    pub slide_count: u32,
    /// Section titles in order.
    pub section_titles: Vec<String>,
}

/// Reference to a retrieved source backing a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Citation {
    /// Identifier of the cited source.
    pub source_id: String,
}

/// A tool call that failed during an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// Tool that failed.
    pub tool: ToolName,
    /// Failure description.
    pub message: String,
    /// Whether the handler compensated for the failure.
    pub resolved: bool,
}

/// Kind-specific body of a candidate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultPayload {
    /// Generated deck stored as an artifact.
    Presentation {
        /// Stored artifact key.
        artifact: ObjectKey,
        /// Structural manifest of the deck.
        manifest: SlideManifest,
        /// Layout family used.
        template: TemplateClass,
    },
    /// Grounded answer with citations.
    Document {
        /// Answer text.
        answer: String,
        /// Sources the answer cites.
        citations: Vec<Citation>,
    },
    /// Extracted numeric fields.
    Financial {
        /// Schema the fields were extracted against.
        schema: String,
        /// Extracted values keyed by field name.
        fields: BTreeMap<String, f64>,
    },
    /// Conversational answer.
    Chat {
        /// Answer text.
        text: String,
    },
}

impl ResultPayload {
    /// Returns the agent kind that produces this payload shape.
    #[must_use]
    pub const fn agent_kind(&self) -> AgentKind {
        match self {
            Self::Presentation { .. } => AgentKind::Presentation,
            Self::Document { .. } => AgentKind::Document,
            Self::Financial { .. } => AgentKind::Financial,
            Self::Chat { .. } => AgentKind::Chat,
        }
    }

    /// Returns the stored artifact key, if the payload has one.
    #[must_use]
    pub const fn artifact(&self) -> Option<&ObjectKey> {
        match self {
            Self::Presentation { artifact, .. } => Some(artifact),
            Self::Document { .. } | Self::Financial { .. } | Self::Chat { .. } => None,
        }
    }

    /// Returns the user-facing text, if the payload is textual.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Document { answer, .. } => Some(answer),
            Self::Chat { text } => Some(text),
            Self::Presentation { .. } | Self::Financial { .. } => None,
        }
    }
}

/// Output of one handler invocation, pending validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    payload: ResultPayload,
    tools_used: Vec<ToolName>,
    tool_failures: Vec<ToolFailure>,
    degraded: bool,
}

impl CandidateResult {
    /// Creates a result with no tools recorded.
    #[must_use]
    pub const fn new(payload: ResultPayload) -> Self {
        Self {
            payload,
            tools_used: Vec::new(),
            tool_failures: Vec::new(),
            degraded: false,
        }
    }

    /// Records a tool as used.
    #[must_use]
    pub fn with_tool(mut self, tool: ToolName) -> Self {
        if !self.tools_used.contains(&tool) {
            self.tools_used.push(tool);
        }
        self
    }

    /// Records several tools as used.
    #[must_use]
    pub fn with_tools(self, tools: impl IntoIterator<Item = ToolName>) -> Self {
        tools.into_iter().fold(self, Self::with_tool)
    }

    /// Records a failed tool call and marks the result degraded.
    #[must_use]
    pub fn with_failure(mut self, failure: ToolFailure) -> Self {
        self.tool_failures.push(failure);
        self.degraded = true;
        self
    }

    /// Records several failed tool calls.
    #[must_use]
    pub fn with_failures(self, failures: impl IntoIterator<Item = ToolFailure>) -> Self {
        failures.into_iter().fold(self, Self::with_failure)
    }

    /// Returns the payload.
    #[must_use]
    pub const fn payload(&self) -> &ResultPayload {
        &self.payload
    }

    /// Returns the agent kind that produced this result.
    #[must_use]
    pub const fn agent_kind(&self) -> AgentKind {
        self.payload.agent_kind()
    }

    /// Returns the tools invoked, in first-use order.
    #[must_use]
    pub fn tools_used(&self) -> &[ToolName] {
        &self.tools_used
    }

    /// Returns failed tool calls.
    #[must_use]
    pub fn tool_failures(&self) -> &[ToolFailure] {
        &self.tool_failures
    }

    /// Returns whether any tool failure is still unresolved.
    #[must_use]
    pub fn has_unresolved_failures(&self) -> bool {
        self.tool_failures.iter().any(|failure| !failure.resolved)
    }

    /// Returns whether the result is a best-effort result after partial
    /// sub-call failure.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }
}
