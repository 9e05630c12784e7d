//! Grounded question answering over attachments and the knowledge base.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use super::{call, parse_attachments};
use crate::agent::{
    domain::{
        AgentCapabilities, CandidateResult, Citation, Escalation, InvocationContext,
        ResultPayload, ToolFailure, ToolName,
    },
    ports::{
        AgentHandler, AgentResult, GenerativeModel, ObjectStore, RetrievalQuery, Retriever,
    },
    prompts,
};
use crate::request::AgentKind;

const MAX_LATENCY: Duration = Duration::from_secs(30);

/// Answers questions from retrieved passages and attachment text, declaring
/// the cited source identifiers.
pub struct DocumentHandler<R, G, S>
where
    R: Retriever,
    G: GenerativeModel,
    S: ObjectStore,
{
    retriever: Arc<R>,
    model: Arc<G>,
    store: Arc<S>,
    capabilities: AgentCapabilities,
    call_timeout: Duration,
}

impl<R, G, S> DocumentHandler<R, G, S>
where
    R: Retriever,
    G: GenerativeModel,
    S: ObjectStore,
{
    /// Creates a handler over a retriever, a generative model, and the
    /// attachment store.
    #[must_use]
    pub fn new(retriever: Arc<R>, model: Arc<G>, store: Arc<S>) -> Self {
        Self {
            retriever,
            model,
            store,
            capabilities: AgentCapabilities::new(
                [
                    ToolName::DocumentParser,
                    ToolName::KnowledgeBaseSearch,
                    ToolName::ContentGeneration,
                ],
                MAX_LATENCY,
            ),
            call_timeout: MAX_LATENCY,
        }
    }

    /// Sets the bound on each backend call.
    #[must_use]
    pub const fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

fn unique_citations<'a>(source_ids: impl IntoIterator<Item = &'a str>) -> Vec<Citation> {
    let mut citations: Vec<Citation> = Vec::new();
    for source_id in source_ids {
        if !citations.iter().any(|citation| citation.source_id == source_id) {
            citations.push(Citation {
                source_id: source_id.to_owned(),
            });
        }
    }
    citations
}

#[async_trait]
impl<R, G, S> AgentHandler for DocumentHandler<R, G, S>
where
    R: Retriever,
    G: GenerativeModel,
    S: ObjectStore,
{
    fn kind(&self) -> AgentKind {
        AgentKind::Document
    }

    fn capabilities(&self) -> &AgentCapabilities {
        &self.capabilities
    }

    async fn invoke(&self, context: &InvocationContext<'_>) -> AgentResult<CandidateResult> {
        let request = context.request();
        let escalation = context.escalation();
        let query = RetrievalQuery {
            text: request.instructions().to_owned(),
            scope: escalation.retrieval_scope(),
            sources: request.files().to_vec(),
            top_k: escalation.top_k(),
        };

        let (attachments, retrieval) = tokio::join!(
            parse_attachments(self.store.as_ref(), request.files(), self.call_timeout),
            call(
                "knowledge base",
                self.call_timeout,
                self.retriever.retrieve(&query)
            ),
        );

        let attachments = attachments?;
        let mut failures = attachments.failures.clone();
        let passages = match retrieval {
            Ok(passages) => passages,
            Err(err) if attachments.excerpts.is_empty() => return Err(err.into()),
            Err(err) => {
                warn!(
                    request_id = %request.id(),
                    error = %err,
                    "retrieval failed; answering from attachments"
                );
                failures.push(ToolFailure {
                    tool: ToolName::KnowledgeBaseSearch,
                    message: err.to_string(),
                    resolved: false,
                });
                Vec::new()
            }
        };

        let prompt = prompts::render(
            prompts::DOCUMENT,
            json!({
                "question": request.instructions(),
                "passages": passages,
                "excerpts": attachments.excerpts,
            }),
        )?;
        let answer = call(
            "generative model",
            self.call_timeout,
            self.model.complete(&prompt),
        )
        .await?;
        let citations = unique_citations(passages.iter().map(|passage| passage.source_id.as_str()));

        let mut tools = vec![ToolName::KnowledgeBaseSearch, ToolName::ContentGeneration];
        if !request.files().is_empty() {
            tools.insert(0, ToolName::DocumentParser);
        }
        Ok(CandidateResult::new(ResultPayload::Document { answer, citations })
            .with_tools(tools)
            .with_failures(failures))
    }

    fn escalate(&self, current: &Escalation, _reasons: &[String]) -> Escalation {
        current.next_level().with_broader_retrieval()
    }
}
