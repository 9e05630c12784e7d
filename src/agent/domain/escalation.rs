//! Retry escalation parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Breadth of a knowledge base retrieval.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalScope {
    /// Only sources derived from the request's attachments.
    #[default]
    Attachments,
    /// The caller's document collection.
    Collection,
    /// Every indexed source.
    Global,
}

impl RetrievalScope {
    /// Returns the next broader scope, saturating at [`RetrievalScope::Global`].
    #[must_use]
    pub const fn broaden(self) -> Self {
        match self {
            Self::Attachments => Self::Collection,
            Self::Collection | Self::Global => Self::Global,
        }
    }

    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attachments => "attachments",
            Self::Collection => "collection",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for RetrievalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const DEFAULT_TOP_K: usize = 5;
const MAX_TOP_K: usize = 50;

/// Parameters a handler adjusts between attempts of the same request.
///
/// The first attempt runs with [`Escalation::default`]; each retry passes
/// the previous value through the handler's escalation hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    level: u32,
    retrieval_scope: RetrievalScope,
    top_k: usize,
    web_search_enabled: bool,
}

impl Default for Escalation {
    fn default() -> Self {
        Self {
            level: 0,
            retrieval_scope: RetrievalScope::default(),
            top_k: DEFAULT_TOP_K,
            web_search_enabled: true,
        }
    }
}

impl Escalation {
    /// Returns the number of escalations applied so far.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Returns the retrieval scope.
    #[must_use]
    pub const fn retrieval_scope(&self) -> RetrievalScope {
        self.retrieval_scope
    }

    /// Returns the number of passages to retrieve.
    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns whether web search may be issued.
    #[must_use]
    pub const fn web_search_enabled(&self) -> bool {
        self.web_search_enabled
    }

    /// Returns a copy one level higher with no parameter changes.
    #[must_use]
    pub fn next_level(&self) -> Self {
        Self {
            level: self.level.saturating_add(1),
            ..self.clone()
        }
    }

    /// Broadens retrieval scope and doubles `top_k`.
    #[must_use]
    pub fn with_broader_retrieval(self) -> Self {
        Self {
            retrieval_scope: self.retrieval_scope.broaden(),
            top_k: self.top_k.saturating_mul(2).min(MAX_TOP_K),
            ..self
        }
    }

    /// Disables web search.
    #[must_use]
    pub const fn without_web_search(mut self) -> Self {
        self.web_search_enabled = false;
        self
    }
}
