//! Request dispatcher driving the pipeline state machine.

use super::execution::Execution;
use crate::agent::{
    domain::{CandidateResult, Escalation, InvocationContext, ResultPayload},
    ports::{AgentError, AgentHandler, ObjectStore},
    services::AgentRegistry,
};
use crate::audit::{ports::AuditStore, services::AuditRecorder};
use crate::classification::{
    domain::ClassificationResult, ports::IntentModel, services::IntentClassifier,
};
use crate::config::OrchestratorConfig;
use crate::dispatch::domain::{
    AgentInvocation, DispatchDomainError, DispatchOutcome, DispatchStatus, InboundRequest,
    InvocationStatus, PipelineError, PipelineState,
};
use crate::request::{AgentKind, Request, RequestError};
use crate::validation::{Verdict, service::OutputValidator};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Terminal result of one execution.
struct Terminal {
    status: DispatchStatus,
    reasons: Vec<String>,
    payload: Option<ResultPayload>,
    degraded: bool,
}

impl Terminal {
    const fn accepted(payload: ResultPayload, degraded: bool) -> Self {
        Self {
            status: DispatchStatus::Accepted,
            reasons: Vec::new(),
            payload: Some(payload),
            degraded,
        }
    }

    const fn failed(reasons: Vec<String>) -> Self {
        Self {
            status: DispatchStatus::Failed,
            reasons,
            payload: None,
            degraded: false,
        }
    }
}

/// Result of one handler attempt.
enum Step {
    Finished(Terminal),
    Retry(Vec<String>),
}

/// Outcome of the handler call itself, before validation.
enum Invoked {
    Cancelled,
    Failed(PipelineError),
    Produced(CandidateResult),
}

/// Outcome of validating one candidate.
enum Checked {
    Cancelled,
    Elapsed,
    Verdict(Verdict),
}

/// Everything fixed once a handler is selected.
struct Selected<'r> {
    request: &'r Request,
    classification: &'r ClassificationResult,
    handler: Arc<dyn AgentHandler>,
    kind: AgentKind,
    cancel: &'r CancellationToken,
    per_attempt: Duration,
    deadline: Option<Instant>,
}

impl Selected<'_> {
    /// Time left before the request deadline, capped by the per-attempt
    /// timeout when the deadline cannot be represented.
    fn remaining(&self) -> Duration {
        self.deadline.map_or(self.per_attempt, |limit| {
            limit.saturating_duration_since(Instant::now())
        })
    }
}

/// Orchestration core: classify, select, invoke, validate, retry.
///
/// The dispatcher holds only read-mostly collaborators; every request runs
/// in its own execution with private state, so one dispatcher serves many
/// concurrent requests.
pub struct Dispatcher<M, S, A, C>
where
    M: IntentModel,
    S: ObjectStore,
    A: AuditStore,
    C: Clock + Send + Sync,
{
    registry: Arc<AgentRegistry>,
    classifier: Arc<IntentClassifier<M>>,
    validator: Arc<OutputValidator<S>>,
    recorder: Arc<AuditRecorder<A, C>>,
    clock: Arc<C>,
    config: Arc<OrchestratorConfig>,
}

impl<M, S, A, C> Dispatcher<M, S, A, C>
where
    M: IntentModel,
    S: ObjectStore,
    A: AuditStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a dispatcher from its collaborators and immutable
    /// configuration.
    #[must_use]
    pub const fn new(
        registry: Arc<AgentRegistry>,
        classifier: Arc<IntentClassifier<M>>,
        validator: Arc<OutputValidator<S>>,
        recorder: Arc<AuditRecorder<A, C>>,
        clock: Arc<C>,
        config: Arc<OrchestratorConfig>,
    ) -> Self {
        Self {
            registry,
            classifier,
            validator,
            recorder,
            clock,
            config,
        }
    }

    /// Returns the audit recorder used by this dispatcher.
    #[must_use]
    pub const fn recorder(&self) -> &Arc<AuditRecorder<A, C>> {
        &self.recorder
    }

    /// Validates an inbound call and dispatches it.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the call is malformed; nothing is
    /// audited in that case because no request exists.
    pub async fn submit(
        &self,
        inbound: InboundRequest,
        cancel: CancellationToken,
    ) -> Result<DispatchOutcome, RequestError> {
        let request = inbound.into_request(self.clock.as_ref())?;
        Ok(self.handle(request, cancel).await)
    }

    /// Runs `request` to a terminal state.
    ///
    /// Never fails: every failure surfaces as a
    /// [`DispatchStatus::Failed`] response carrying public reasons.
    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(request_id = %request.id(), user_id = %request.caller().user_id())
    )]
    pub async fn handle(&self, mut request: Request, cancel: CancellationToken) -> DispatchOutcome {
        let mut execution = Execution::new(&self.recorder, &request);
        let terminal = match self.run(&mut request, &mut execution, &cancel).await {
            Ok(terminal) => terminal,
            Err(err) => {
                error!(error = %err, "pipeline invariant violated");
                if !execution.state().is_terminal() {
                    let detail = err.to_string();
                    let attempt = execution.last_attempt();
                    if let Err(fail_err) = execution
                        .advance(&request, PipelineState::Failed, attempt, |details| {
                            details.with_reasons(vec![detail])
                        })
                        .await
                    {
                        error!(error = %fail_err, "could not record failure");
                    }
                }
                Terminal::failed(vec!["internal error".to_owned()])
            }
        };

        let (base, invocations) = execution.finish(&request, terminal.status, terminal.reasons);
        let mut response = match terminal.payload {
            Some(payload) => base.with_payload(&payload),
            None => base,
        };
        response.degraded = terminal.degraded;
        if response.audit_degraded {
            warn!(
                error = %PipelineError::AuditWrite("entries queued for reconciliation".to_owned()),
                "response is audit-degraded"
            );
        }
        info!(
            status = ?response.status,
            attempts = response.attempts,
            agent_kind = ?response.agent_kind_used,
            "request finished"
        );
        DispatchOutcome {
            response,
            invocations,
        }
    }

    async fn run(
        &self,
        request: &mut Request,
        execution: &mut Execution<'_, A, C>,
        cancel: &CancellationToken,
    ) -> Result<Terminal, DispatchDomainError> {
        if cancel.is_cancelled() {
            return fail(request, execution, 0, &PipelineError::Cancelled).await;
        }
        let classified = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = self.classifier.classify(request) => Some(result),
        };
        let Some(classification) = classified else {
            return fail(request, execution, 0, &PipelineError::Cancelled).await;
        };

        let request_kind = classification.kind();
        if let Err(err) = request.classify(request_kind) {
            warn!(error = %err, "request kind already set");
        }
        if classification.is_degraded() {
            warn!(
                error = %PipelineError::Classification(classification.rationale().to_owned()),
                "continuing with degraded classification"
            );
        }
        let confidence = classification.confidence().value();
        let degraded = classification.is_degraded();
        execution
            .advance(request, PipelineState::Classified, 0, |details| {
                details
                    .with_request_kind(request_kind)
                    .with_confidence(confidence, degraded)
            })
            .await?;

        self.select_and_run(request, &classification, execution, cancel)
            .await
    }

    async fn select_and_run(
        &self,
        request: &Request,
        classification: &ClassificationResult,
        execution: &mut Execution<'_, A, C>,
        cancel: &CancellationToken,
    ) -> Result<Terminal, DispatchDomainError> {
        let request_kind = classification.kind();
        let handler = request_kind
            .agent_kind()
            .filter(|kind| self.config.supports(*kind))
            .and_then(|kind| self.registry.get(kind));
        let Some(handler) = handler else {
            let err = PipelineError::UnsupportedKind(request_kind);
            return fail(request, execution, 0, &err).await;
        };
        let kind = handler.kind();
        let held = request.caller().role();
        if !held.permits(kind.required_role()) {
            let err = PipelineError::Unauthorized { held, kind };
            return fail(request, execution, 0, &err).await;
        }

        execution.select(kind);
        execution
            .advance(request, PipelineState::AgentSelected, 0, |details| {
                details.with_agent_kind(kind)
            })
            .await?;

        let declared = handler.capabilities().max_latency();
        let per_attempt = self.config.agent_timeout(kind, declared);
        let deadline = Instant::now().checked_add(self.config.request_deadline(kind, declared));
        let selected = Selected {
            request,
            classification,
            handler,
            kind,
            cancel,
            per_attempt,
            deadline,
        };
        self.run_attempts(&selected, execution).await
    }

    async fn run_attempts(
        &self,
        selected: &Selected<'_>,
        execution: &mut Execution<'_, A, C>,
    ) -> Result<Terminal, DispatchDomainError> {
        let mut escalation = Escalation::default();
        let mut attempt = 1_u32;
        loop {
            let remaining = selected.remaining();
            if remaining.is_zero() {
                let last = attempt.saturating_sub(1);
                let err = PipelineError::DeadlineExceeded;
                return fail(selected.request, execution, last, &err).await;
            }
            let timeout = selected.per_attempt.min(remaining);
            match self
                .run_attempt(selected, execution, attempt, &escalation, timeout)
                .await?
            {
                Step::Finished(terminal) => return Ok(terminal),
                Step::Retry(reasons) => {
                    escalation = selected.handler.escalate(&escalation, &reasons);
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn run_attempt(
        &self,
        selected: &Selected<'_>,
        execution: &mut Execution<'_, A, C>,
        attempt: u32,
        escalation: &Escalation,
        timeout: Duration,
    ) -> Result<Step, DispatchDomainError> {
        let request = selected.request;
        execution.advance(request, PipelineState::Invoking, attempt, |details| details).await?;
        let mut invocation =
            AgentInvocation::start(request.id(), selected.kind, attempt, self.clock.as_ref());
        let context = InvocationContext::new(
            request,
            selected.classification,
            attempt,
            escalation,
            selected.cancel.clone(),
        );

        match invoke_once(selected, &context, timeout).await {
            Invoked::Cancelled => {
                invocation.fail("cancelled", self.clock.as_ref())?;
                execution.push_invocation(invocation);
                let err = PipelineError::Cancelled;
                fail(request, execution, attempt, &err).await.map(Step::Finished)
            }
            Invoked::Failed(err) => {
                warn!(attempt, error = %err, "agent invocation failed");
                invocation.fail(err.to_string(), self.clock.as_ref())?;
                execution.push_invocation(invocation);
                self.after_failure(selected, execution, attempt, InvocationStatus::Failed, &err)
                    .await
            }
            Invoked::Produced(candidate) => {
                self.validate(selected, execution, invocation, candidate).await
            }
        }
    }

    async fn validate(
        &self,
        selected: &Selected<'_>,
        execution: &mut Execution<'_, A, C>,
        mut invocation: AgentInvocation,
        candidate: CandidateResult,
    ) -> Result<Step, DispatchDomainError> {
        let request = selected.request;
        let attempt = invocation.attempt_number();
        let tools: Vec<&'static str> = candidate
            .tools_used()
            .iter()
            .map(|tool| tool.as_str())
            .collect();
        execution.note_tools(tools.iter().copied());
        let degraded = candidate.is_degraded();
        if degraded {
            warn!(
                attempt,
                failures = candidate.tool_failures().len(),
                "candidate is a best-effort result"
            );
        }
        let failures = candidate.tool_failures().to_vec();
        execution
            .advance(request, PipelineState::Validating, attempt, |details| {
                details
                    .with_tools_used(tools.iter().map(|tool| (*tool).to_owned()).collect())
                    .with_degradation(degraded, failures)
            })
            .await?;

        let budget = selected.remaining();
        let checked = tokio::select! {
            biased;
            () = selected.cancel.cancelled() => Checked::Cancelled,
            verdict = tokio::time::timeout(
                budget,
                self.validator.validate(request, selected.kind, &candidate),
            ) => verdict.map_or(Checked::Elapsed, Checked::Verdict),
        };
        let result_ref = candidate
            .payload()
            .artifact()
            .map(|key| key.as_str().to_owned());
        let verdict = match checked {
            Checked::Verdict(verdict) => verdict,
            Checked::Cancelled => {
                invocation.fail("cancelled", self.clock.as_ref())?;
                execution.push_invocation(invocation);
                return fail(request, execution, attempt, &PipelineError::Cancelled)
                    .await
                    .map(Step::Finished);
            }
            Checked::Elapsed => {
                let detail = format!(
                    "validation exceeded the request deadline after {}ms",
                    budget.as_millis()
                );
                invocation.fail(detail, self.clock.as_ref())?;
                execution.push_invocation(invocation);
                return fail(request, execution, attempt, &PipelineError::DeadlineExceeded)
                    .await
                    .map(Step::Finished);
            }
        };

        if verdict.is_accepted() {
            invocation.succeed(result_ref, self.clock.as_ref())?;
            execution.push_invocation(invocation);
            execution
                .advance(request, PipelineState::Accepted, attempt, |details| {
                    details.with_invocation_status(InvocationStatus::Succeeded)
                })
                .await?;
            return Ok(Step::Finished(Terminal::accepted(
                candidate.payload().clone(),
                degraded,
            )));
        }

        invocation.reject(result_ref, verdict.reasons().to_vec(), self.clock.as_ref())?;
        execution.push_invocation(invocation);
        let rejection = rejection_error(&verdict);
        info!(attempt, error = %rejection, "candidate rejected");
        self.after_failure(
            selected,
            execution,
            attempt,
            InvocationStatus::Rejected,
            &rejection,
        )
        .await
    }

    /// Retries when the error allows it and attempts remain; otherwise
    /// escalates to failure.
    async fn after_failure(
        &self,
        selected: &Selected<'_>,
        execution: &mut Execution<'_, A, C>,
        attempt: u32,
        status: InvocationStatus,
        err: &PipelineError,
    ) -> Result<Step, DispatchDomainError> {
        let request = selected.request;
        if selected.cancel.is_cancelled() {
            return fail(request, execution, attempt, &PipelineError::Cancelled)
                .await
                .map(Step::Finished);
        }
        let reasons = internal_reasons(err);
        if err.is_retryable() && attempt < self.config.max_attempts() {
            let audited = reasons.clone();
            execution
                .advance(request, PipelineState::Retrying, attempt, |details| {
                    details
                        .with_invocation_status(status)
                        .with_reasons(audited)
                })
                .await?;
            return Ok(Step::Retry(reasons));
        }

        let audited = reasons.clone();
        execution
            .advance(request, PipelineState::Escalated, attempt, |details| {
                details.with_invocation_status(status).with_reasons(audited)
            })
            .await?;
        execution
            .advance(request, PipelineState::Failed, attempt, |details| {
                details.with_reasons(reasons)
            })
            .await?;
        Ok(Step::Finished(Terminal::failed(err.public_reasons())))
    }
}

/// Moves straight to `Failed` from the current state.
async fn fail<A, C>(
    request: &Request,
    execution: &mut Execution<'_, A, C>,
    attempt: u32,
    err: &PipelineError,
) -> Result<Terminal, DispatchDomainError>
where
    A: AuditStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    warn!(attempt, error = %err, "request failed");
    let detail = err.to_string();
    execution
        .advance(request, PipelineState::Failed, attempt, |details| {
            details.with_reasons(vec![detail])
        })
        .await?;
    Ok(Terminal::failed(err.public_reasons()))
}

async fn invoke_once(
    selected: &Selected<'_>,
    context: &InvocationContext<'_>,
    timeout: Duration,
) -> Invoked {
    let kind = selected.kind;
    let called = tokio::select! {
        biased;
        () = selected.cancel.cancelled() => None,
        result = tokio::time::timeout(timeout, selected.handler.invoke(context)) => Some(result),
    };
    match called {
        None | Some(Ok(Err(AgentError::Cancelled))) => Invoked::Cancelled,
        Some(Ok(Ok(candidate))) => Invoked::Produced(candidate),
        Some(Ok(Err(AgentError::Storage(err)))) => {
            Invoked::Failed(PipelineError::Storage(err.to_string()))
        }
        Some(Ok(Err(err))) => Invoked::Failed(PipelineError::AgentInvocation {
            kind,
            detail: err.to_string(),
        }),
        Some(Err(_elapsed)) => Invoked::Failed(PipelineError::AgentInvocation {
            kind,
            detail: format!("timed out after {}ms", timeout.as_millis()),
        }),
    }
}

fn rejection_error(verdict: &Verdict) -> PipelineError {
    PipelineError::ValidationRejection {
        retryable: verdict.is_retryable(),
        reasons: verdict.reasons().to_vec(),
        public_reasons: verdict.public_reasons().to_vec(),
    }
}

/// Reasons recorded in the audit trail and passed to escalation hooks.
fn internal_reasons(err: &PipelineError) -> Vec<String> {
    match err {
        PipelineError::ValidationRejection { reasons, .. } => reasons.clone(),
        other => vec![other.to_string()],
    }
}
