//! Ports for generative, retrieval, search, and extraction backends.

use crate::agent::domain::{DeckOutline, RetrievalScope};
use crate::config::FinancialSchema;
use crate::request::FileKey;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors returned by external backends.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("{backend} unavailable: {reason}")]
    Unavailable {
        /// Backend name.
        backend: &'static str,
        /// Failure description.
        reason: String,
    },

    /// The call exceeded its timeout.
    #[error("{backend} timed out")]
    Timeout {
        /// Backend name.
        backend: &'static str,
    },

    /// The backend answered with an unusable payload.
    #[error("{backend} returned a malformed answer: {reason}")]
    Malformed {
        /// Backend name.
        backend: &'static str,
        /// Failure description.
        reason: String,
    },

    /// Transport-level failure.
    #[error("backend transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl BackendError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Creates an unavailability error.
    pub fn unavailable(backend: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            backend,
            reason: reason.into(),
        }
    }
}

/// Generative model used for content generation.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Completes `prompt` with free text.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the model cannot be reached or answers
    /// with an empty completion.
    async fn complete(&self, prompt: &str) -> BackendResult<String>;

    /// Produces a structured deck outline for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Malformed`] when the model output does not
    /// describe a deck.
    async fn outline(&self, prompt: &str) -> BackendResult<DeckOutline>;
}

/// Knowledge base retrieval query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// Natural-language query.
    pub text: String,
    /// Breadth of the search.
    pub scope: RetrievalScope,
    /// Attachments restricting [`RetrievalScope::Attachments`] searches.
    pub sources: Vec<FileKey>,
    /// Number of passages wanted.
    pub top_k: usize,
}

/// Passage returned by a retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Identifier of the source document.
    pub source_id: String,
    /// Passage text.
    pub text: String,
    /// Relevance score reported by the backend.
    pub score: f64,
}

/// Knowledge base retrieval backend.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retrieves passages relevant to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the knowledge base cannot be queried.
    async fn retrieve(&self, query: &RetrievalQuery) -> BackendResult<Vec<Passage>>;
}

/// Web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    /// Relevant excerpt.
    pub snippet: String,
}

/// Public web search backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Searches the web for `query`, returning at most `max_results` hits.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the search provider fails.
    async fn search(&self, query: &str, max_results: usize) -> BackendResult<Vec<SearchHit>>;
}

/// Field extraction input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Source text to extract from.
    pub text: String,
    /// Fields to extract.
    pub schema: FinancialSchema,
}

/// Structured numeric extraction backend.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extracts numeric fields declared by the request schema.
    ///
    /// Fields the backend cannot find are omitted from the map.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when extraction fails outright.
    async fn extract(&self, request: &ExtractionRequest) -> BackendResult<BTreeMap<String, f64>>;
}
