//! Structured numeric extraction handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{call, parse_attachments};
use crate::agent::{
    domain::{AgentCapabilities, CandidateResult, InvocationContext, ResultPayload, ToolName},
    ports::{AgentHandler, AgentResult, ExtractionRequest, FieldExtractor, ObjectStore},
};
use crate::config::FinancialSchema;
use crate::request::AgentKind;

const MAX_LATENCY: Duration = Duration::from_secs(45);

/// Extracts numeric fields declared by a schema from attachment text.
pub struct FinancialHandler<X, S>
where
    X: FieldExtractor,
    S: ObjectStore,
{
    extractor: Arc<X>,
    store: Arc<S>,
    schema: FinancialSchema,
    capabilities: AgentCapabilities,
    call_timeout: Duration,
}

impl<X, S> FinancialHandler<X, S>
where
    X: FieldExtractor,
    S: ObjectStore,
{
    /// Creates a handler extracting against `schema`.
    #[must_use]
    pub fn new(extractor: Arc<X>, store: Arc<S>, schema: FinancialSchema) -> Self {
        Self {
            extractor,
            store,
            schema,
            capabilities: AgentCapabilities::new(
                [ToolName::DocumentParser, ToolName::FieldExtraction],
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

#[async_trait]
impl<X, S> AgentHandler for FinancialHandler<X, S>
where
    X: FieldExtractor,
    S: ObjectStore,
{
    fn kind(&self) -> AgentKind {
        AgentKind::Financial
    }

    fn capabilities(&self) -> &AgentCapabilities {
        &self.capabilities
    }

    async fn invoke(&self, context: &InvocationContext<'_>) -> AgentResult<CandidateResult> {
        let request = context.request();
        let attachments =
            parse_attachments(self.store.as_ref(), request.files(), self.call_timeout).await?;
        let source_text = if attachments.excerpts.is_empty() {
            request.instructions().to_owned()
        } else {
            format!("{}\n{}", request.instructions(), attachments.joined_text())
        };

        let extraction = ExtractionRequest {
            text: source_text,
            schema: self.schema.clone(),
        };
        let fields = call(
            "field extractor",
            self.call_timeout,
            self.extractor.extract(&extraction),
        )
        .await?;

        let mut tools = vec![ToolName::FieldExtraction];
        if !request.files().is_empty() {
            tools.insert(0, ToolName::DocumentParser);
        }
        Ok(CandidateResult::new(ResultPayload::Financial {
            schema: self.schema.name.clone(),
            fields,
        })
        .with_tools(tools)
        .with_failures(attachments.failures))
    }
}
