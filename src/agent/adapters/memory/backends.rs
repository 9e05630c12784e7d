//! Scripted backends for tests and offline runs.
//!
//! Each backend returns a fixed answer (or a fixed failure) and records the
//! calls it receives so tests can assert on escalation behaviour.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::agent::{
    domain::{DeckOutline, RetrievalScope, SectionOutline, SlideOutline},
    ports::{
        BackendError, BackendResult, ExtractionRequest, FieldExtractor, GenerativeModel, Passage,
        RetrievalQuery, Retriever, SearchHit, WebSearch,
    },
};

fn record<T: Clone>(log: &Mutex<Vec<T>>, value: &T) {
    if let Ok(mut entries) = log.lock() {
        entries.push(value.clone());
    }
}

fn snapshot<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
    log.lock().map(|entries| entries.clone()).unwrap_or_default()
}

/// Generative model returning a fixed completion and outline.
#[derive(Debug, Clone)]
pub struct ScriptedGenerativeModel {
    completion: String,
    outline: DeckOutline,
    failure: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl Default for ScriptedGenerativeModel {
    fn default() -> Self {
        Self {
            completion: "Scripted answer.".to_owned(),
            outline: deck_with_slides("Scripted deck", 5),
            failure: None,
            prompts: Arc::default(),
        }
    }
}

/// Builds a single-section outline with `slide_count` slides.
#[must_use]
pub fn deck_with_slides(title: &str, slide_count: usize) -> DeckOutline {
    DeckOutline {
        title: title.to_owned(),
        sections: vec![SectionOutline {
            title: "Overview".to_owned(),
            slides: (1..=slide_count)
                .map(|index| SlideOutline {
                    title: format!("Slide {index}"),
                    bullets: Vec::new(),
                })
                .collect(),
        }],
    }
}

impl ScriptedGenerativeModel {
    /// Creates a model with default answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text completion.
    #[must_use]
    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = completion.into();
        self
    }

    /// Sets the deck outline.
    #[must_use]
    pub fn with_outline(mut self, outline: DeckOutline) -> Self {
        self.outline = outline;
        self
    }

    /// Sets a single-section outline with `slide_count` slides.
    #[must_use]
    pub fn with_slides(self, title: &str, slide_count: usize) -> Self {
        self.with_outline(deck_with_slides(title, slide_count))
    }

    /// Makes every call fail.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Returns the prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        snapshot(&self.prompts)
    }

    fn check(&self) -> BackendResult<()> {
        match &self.failure {
            Some(reason) => Err(BackendError::unavailable("generative model", reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GenerativeModel for ScriptedGenerativeModel {
    async fn complete(&self, prompt: &str) -> BackendResult<String> {
        record(&self.prompts, &prompt.to_owned());
        self.check()?;
        Ok(self.completion.clone())
    }

    async fn outline(&self, prompt: &str) -> BackendResult<DeckOutline> {
        record(&self.prompts, &prompt.to_owned());
        self.check()?;
        Ok(self.outline.clone())
    }
}

/// Retriever returning fixed passages per scope.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRetriever {
    passages: BTreeMap<RetrievalScope, Vec<Passage>>,
    failure: Option<String>,
    queries: Arc<Mutex<Vec<RetrievalQuery>>>,
}

impl ScriptedRetriever {
    /// Creates a retriever that finds nothing at any scope.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a retriever returning `passages` at every scope.
    #[must_use]
    pub fn returning(passages: Vec<Passage>) -> Self {
        let all = [
            RetrievalScope::Attachments,
            RetrievalScope::Collection,
            RetrievalScope::Global,
        ];
        all.into_iter()
            .fold(Self::empty(), |retriever, scope| {
                retriever.with_scope(scope, passages.clone())
            })
    }

    /// Sets the passages returned at `scope`.
    #[must_use]
    pub fn with_scope(mut self, scope: RetrievalScope, passages: Vec<Passage>) -> Self {
        self.passages.insert(scope, passages);
        self
    }

    /// Makes every call fail.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Returns the queries received so far.
    #[must_use]
    pub fn queries(&self) -> Vec<RetrievalQuery> {
        snapshot(&self.queries)
    }
}

#[async_trait]
impl Retriever for ScriptedRetriever {
    async fn retrieve(&self, query: &RetrievalQuery) -> BackendResult<Vec<Passage>> {
        record(&self.queries, query);
        if let Some(reason) = &self.failure {
            return Err(BackendError::unavailable("knowledge base", reason.clone()));
        }
        Ok(self
            .passages
            .get(&query.scope)
            .map(|passages| passages.iter().take(query.top_k).cloned().collect())
            .unwrap_or_default())
    }
}

/// Web search returning fixed hits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWebSearch {
    hits: Vec<SearchHit>,
    failure: Option<String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedWebSearch {
    /// Creates a search backend returning `hits`.
    #[must_use]
    pub fn returning(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    /// Makes every call fail.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Returns the queries received so far.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        snapshot(&self.queries)
    }
}

#[async_trait]
impl WebSearch for ScriptedWebSearch {
    async fn search(&self, query: &str, max_results: usize) -> BackendResult<Vec<SearchHit>> {
        record(&self.queries, &query.to_owned());
        if let Some(reason) = &self.failure {
            return Err(BackendError::unavailable("web search", reason.clone()));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

/// Field extractor returning fixed values.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFieldExtractor {
    fields: BTreeMap<String, f64>,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl ScriptedFieldExtractor {
    /// Creates an extractor returning `fields`.
    #[must_use]
    pub fn returning<'a>(fields: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value))
                .collect(),
            ..Self::default()
        }
    }

    /// Makes every call fail.
    #[must_use]
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Returns the extraction requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        snapshot(&self.requests)
    }
}

#[async_trait]
impl FieldExtractor for ScriptedFieldExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> BackendResult<BTreeMap<String, f64>> {
        record(&self.requests, request);
        if let Some(reason) = &self.failure {
            return Err(BackendError::unavailable("field extractor", reason.clone()));
        }
        Ok(self
            .fields
            .iter()
            .filter(|(name, _)| request.schema.field(name).is_some())
            .map(|(name, value)| (name.clone(), *value))
            .collect())
    }
}
