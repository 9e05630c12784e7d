//! Handler capability declarations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// External tool a handler may invoke.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Generative model completion.
    ContentGeneration,
    /// Knowledge base retrieval.
    KnowledgeBaseSearch,
    /// Public web search.
    WebSearch,
    /// Attachment text extraction.
    DocumentParser,
    /// Structured numeric field extraction.
    FieldExtraction,
    /// Artifact storage.
    ObjectStore,
}

impl ToolName {
    /// Returns the name reported to callers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContentGeneration => "content_generation",
            Self::KnowledgeBaseSearch => "knowledge_base_search",
            Self::WebSearch => "web_search",
            Self::DocumentParser => "document_parser",
            Self::FieldExtraction => "field_extraction",
            Self::ObjectStore => "object_store",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set and latency bound declared by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCapabilities {
    tools: Vec<ToolName>,
    max_latency: Duration,
}

impl AgentCapabilities {
    /// Creates a capability declaration.
    #[must_use]
    pub fn new(tools: impl IntoIterator<Item = ToolName>, max_latency: Duration) -> Self {
        let mut declared: Vec<ToolName> = tools.into_iter().collect();
        declared.sort_unstable();
        declared.dedup();
        Self {
            tools: declared,
            max_latency,
        }
    }

    /// Returns the tools this handler may invoke.
    #[must_use]
    pub fn tools(&self) -> &[ToolName] {
        &self.tools
    }

    /// Returns whether the handler may invoke `tool`.
    #[must_use]
    pub fn uses(&self, tool: ToolName) -> bool {
        self.tools.contains(&tool)
    }

    /// Returns the maximum expected latency of one invocation.
    #[must_use]
    pub const fn max_latency(&self) -> Duration {
        self.max_latency
    }
}
