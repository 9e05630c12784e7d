//! Slide deck generation handler.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{call, content_digest};
use crate::agent::{
    domain::{
        AgentCapabilities, CandidateResult, InvocationContext, ObjectKey, ResultPayload,
        SlideManifest, TemplateClass, ToolName,
    },
    ports::{AgentError, AgentHandler, AgentResult, GenerativeModel, ObjectStore, PutObject},
    prompts,
};
use crate::classification::rules;
use crate::request::AgentKind;

const MAX_LATENCY: Duration = Duration::from_secs(60);
const ARTIFACT_SCOPE: &str = "artifacts";
const DECK_CONTENT_TYPE: &str = "application/json";

/// Generates a deck outline and stores it as an artifact.
pub struct PresentationHandler<G, S>
where
    G: GenerativeModel,
    S: ObjectStore,
{
    model: Arc<G>,
    store: Arc<S>,
    capabilities: AgentCapabilities,
    call_timeout: Duration,
}

impl<G, S> PresentationHandler<G, S>
where
    G: GenerativeModel,
    S: ObjectStore,
{
    /// Creates a handler over a generative model and the artifact store.
    #[must_use]
    pub fn new(model: Arc<G>, store: Arc<S>) -> Self {
        Self {
            model,
            store,
            capabilities: AgentCapabilities::new(
                [ToolName::ContentGeneration, ToolName::ObjectStore],
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

/// Finds an explicit slide count such as "10 slide", "10-slide" or
/// "12 slides" in `text`.
#[must_use]
pub fn requested_slide_count(text: &str) -> Option<u32> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|ch: char| ch.is_whitespace() || ch == '-')
        .filter(|word| !word.is_empty())
        .collect();
    words.windows(2).find_map(|pair| match pair {
        [count, noun] if noun.starts_with("slide") => count.parse().ok(),
        _ => None,
    })
}

#[async_trait]
impl<G, S> AgentHandler for PresentationHandler<G, S>
where
    G: GenerativeModel,
    S: ObjectStore,
{
    fn kind(&self) -> AgentKind {
        AgentKind::Presentation
    }

    fn capabilities(&self) -> &AgentCapabilities {
        &self.capabilities
    }

    async fn invoke(&self, context: &InvocationContext<'_>) -> AgentResult<CandidateResult> {
        let request = context.request();
        let content_types = request.content_types();
        let template = if rules::is_financial(request.instructions(), &content_types) {
            TemplateClass::Financial
        } else {
            TemplateClass::Standard
        };
        let attachments: Vec<&str> = request.files().iter().map(|file| file.file_name()).collect();
        let prompt = prompts::render(
            prompts::PRESENTATION,
            json!({
                "template": template.as_str(),
                "instructions": request.instructions(),
                "slide_count": requested_slide_count(request.instructions()),
                "attachments": attachments,
            }),
        )?;

        let outline = call(
            "generative model",
            self.call_timeout,
            self.model.outline(&prompt),
        )
        .await?;
        if context.cancel().is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let manifest = SlideManifest {
            slide_count: u32::try_from(outline.slide_count()).unwrap_or(u32::MAX),
            section_titles: outline.section_titles(),
        };
        let bytes = serde_json::to_vec_pretty(&outline)
            .map_err(|err| AgentError::Encoding(err.to_string()))?;
        let digest = content_digest(&bytes);
        let key = ObjectKey::artifact(
            ARTIFACT_SCOPE,
            request.caller().user_id(),
            request.id(),
            &format!("{}.deck.json", outline.title),
        );
        let object = PutObject::new(key, bytes, DECK_CONTENT_TYPE)
            .with_tag("uploader", request.caller().user_id().as_str())
            .with_tag("request_id", request.id().to_string())
            .with_tag("agent_kind", AgentKind::Presentation.as_str())
            .with_tag("digest", digest)
            .with_tag("purpose", "generated_artifact")
            .with_tag("retention", "long_term")
            .with_metadata("template", template.as_str())
            .with_metadata("slide_count", manifest.slide_count.to_string());
        let stored = self.store.put(object).await?;
        debug!(
            request_id = %request.id(),
            artifact = %stored,
            slides = manifest.slide_count,
            "deck stored"
        );

        Ok(CandidateResult::new(ResultPayload::Presentation {
            artifact: stored,
            manifest,
            template,
        })
        .with_tools([ToolName::ContentGeneration, ToolName::ObjectStore]))
    }
}
