//! Output validator service.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::{
    domain::{CandidateResult, ObjectKey, ResultPayload},
    ports::ObjectStore,
};
use crate::config::ValidatorConfig;
use crate::request::{AgentKind, Request};
use crate::validation::{Rejection, Verdict, rules};

/// Applies per-kind correctness checks to candidate results.
pub struct OutputValidator<S>
where
    S: ObjectStore,
{
    store: Arc<S>,
    config: ValidatorConfig,
}

impl<S> OutputValidator<S>
where
    S: ObjectStore,
{
    /// Creates a validator resolving artifacts through `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, config: ValidatorConfig) -> Self {
        Self { store, config }
    }

    /// Validates `candidate`, produced for `request` by the `expected` kind.
    pub async fn validate(
        &self,
        request: &Request,
        expected: AgentKind,
        candidate: &CandidateResult,
    ) -> Verdict {
        let mut rejections = Vec::new();
        if let Err(rejection) = rules::check_kind(candidate, expected) {
            rejections.push(rejection);
            return Verdict::from_rejections(&rejections);
        }

        match candidate.payload() {
            ResultPayload::Presentation {
                artifact, manifest, ..
            } => {
                rejections.extend(rules::check_slide_count(manifest, self.config.max_slides).err());
                rejections.extend(self.check_artifact(artifact).await.err());
            }
            ResultPayload::Document { citations, .. } => {
                rejections.extend(rules::check_citations(citations, request.mode()).err());
            }
            ResultPayload::Financial { fields, .. } => {
                rejections.extend(rules::check_financial_fields(
                    fields,
                    &self.config.financial_schema,
                ));
            }
            ResultPayload::Chat { text } => {
                rejections.extend(rules::check_response_text(text).err());
                rejections.extend(rules::check_tool_failures(candidate));
            }
        }

        let verdict = Verdict::from_rejections(&rejections);
        debug!(
            request_id = %request.id(),
            kind = %expected,
            accepted = verdict.is_accepted(),
            retryable = verdict.is_retryable(),
            "candidate validated"
        );
        verdict
    }

    async fn check_artifact(&self, artifact: &ObjectKey) -> Result<(), Rejection> {
        let timeout = self.config.lookup_timeout();
        match tokio::time::timeout(timeout, self.store.head(artifact)).await {
            Ok(Ok(Some(_))) => Ok(()),
            Ok(Ok(None)) => Err(Rejection::ArtifactUnresolvable(artifact.clone())),
            Ok(Err(err)) => {
                warn!(
                    artifact = %artifact,
                    error = %err,
                    "artifact lookup failed during validation"
                );
                Err(Rejection::ArtifactUnresolvable(artifact.clone()))
            }
            Err(_) => {
                warn!(
                    artifact = %artifact,
                    timeout_ms = timeout.as_millis(),
                    "artifact lookup timed out during validation"
                );
                Err(Rejection::ArtifactUnresolvable(artifact.clone()))
            }
        }
    }
}
