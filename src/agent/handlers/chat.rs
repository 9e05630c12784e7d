//! Conversational handler with optional web search.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::call;
use crate::agent::{
    domain::{
        AgentCapabilities, CandidateResult, Escalation, InvocationContext, ResultPayload,
        ToolFailure, ToolName,
    },
    ports::{AgentHandler, AgentResult, GenerativeModel, WebSearch},
    prompts,
};
use crate::request::AgentKind;

const MAX_LATENCY: Duration = Duration::from_secs(20);
const MAX_SEARCH_RESULTS: usize = 5;

/// Answers conversationally, searching the web first when the request needs
/// current information.
pub struct ChatHandler<G, W>
where
    G: GenerativeModel,
    W: WebSearch,
{
    model: Arc<G>,
    search: Arc<W>,
    web_search_threshold: f64,
    capabilities: AgentCapabilities,
    call_timeout: Duration,
}

impl<G, W> ChatHandler<G, W>
where
    G: GenerativeModel,
    W: WebSearch,
{
    /// Creates a handler that searches when the classifier's
    /// "needs current information" score exceeds `web_search_threshold`.
    #[must_use]
    pub fn new(model: Arc<G>, search: Arc<W>, web_search_threshold: f64) -> Self {
        Self {
            model,
            search,
            web_search_threshold,
            capabilities: AgentCapabilities::new(
                [ToolName::WebSearch, ToolName::ContentGeneration],
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
impl<G, W> AgentHandler for ChatHandler<G, W>
where
    G: GenerativeModel,
    W: WebSearch,
{
    fn kind(&self) -> AgentKind {
        AgentKind::Chat
    }

    fn capabilities(&self) -> &AgentCapabilities {
        &self.capabilities
    }

    async fn invoke(&self, context: &InvocationContext<'_>) -> AgentResult<CandidateResult> {
        let request = context.request();
        let wants_search = context.escalation().web_search_enabled()
            && context
                .classification()
                .needs_current_information()
                .exceeds(self.web_search_threshold);

        let mut hits = Vec::new();
        let mut failure = None;
        if wants_search {
            match call(
                "web search",
                self.call_timeout,
                self.search.search(request.instructions(), MAX_SEARCH_RESULTS),
            )
            .await
            {
                Ok(found) => {
                    debug!(request_id = %request.id(), hits = found.len(), "web search complete");
                    hits = found;
                }
                Err(err) => {
                    warn!(
                        request_id = %request.id(),
                        error = %err,
                        "web search failed; answering without it"
                    );
                    failure = Some(ToolFailure {
                        tool: ToolName::WebSearch,
                        message: err.to_string(),
                        resolved: false,
                    });
                }
            }
        }

        let prompt = prompts::render(
            prompts::CHAT,
            json!({
                "hits": hits,
                "search_unavailable": failure.is_some(),
                "message": request.instructions(),
            }),
        )?;
        let text = call("generative model", self.call_timeout, self.model.complete(&prompt)).await?;

        let mut result = CandidateResult::new(ResultPayload::Chat { text });
        if wants_search {
            result = result.with_tool(ToolName::WebSearch);
        }
        Ok(result
            .with_tool(ToolName::ContentGeneration)
            .with_failures(failure))
    }

    fn escalate(&self, current: &Escalation, reasons: &[String]) -> Escalation {
        let search_failed = reasons
            .iter()
            .any(|reason| reason.contains(ToolName::WebSearch.as_str()));
        if search_failed {
            current.next_level().without_web_search()
        } else {
            current.next_level()
        }
    }
}
