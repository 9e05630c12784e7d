//! Tests for the dispatcher state machine over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::{Backends, Harness, caller, handlers, harness, harness_with, request};
use crate::agent::{
    adapters::memory::{
        InMemoryObjectStore, ScriptedFieldExtractor, ScriptedRetriever, ScriptedWebSearch,
    },
    domain::{
        AgentCapabilities, CandidateResult, InvocationContext, ObjectKey, ResultPayload,
        RetrievalScope, ToolName,
    },
    ports::{AgentHandler, AgentResult, ObjectStore, Passage},
};
use crate::audit::{domain::AuditEntry, ports::AuditStore};
use crate::config::OrchestratorConfig;
use crate::dispatch::domain::{
    DispatchStatus, InboundRequest, InvocationStatus, PipelineState,
};
use crate::request::{AgentKind, FileKey, RequestError, RequestId, RequestMode, Role};

/// Chat handler that never answers within any reasonable timeout.
struct StallingHandler {
    capabilities: AgentCapabilities,
}

impl StallingHandler {
    fn new() -> Self {
        Self {
            capabilities: AgentCapabilities::new(
                [ToolName::ContentGeneration],
                Duration::from_secs(30),
            ),
        }
    }
}

#[async_trait]
impl AgentHandler for StallingHandler {
    fn kind(&self) -> AgentKind {
        AgentKind::Chat
    }

    fn capabilities(&self) -> &AgentCapabilities {
        &self.capabilities
    }

    async fn invoke(&self, _context: &InvocationContext<'_>) -> AgentResult<CandidateResult> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(CandidateResult::new(ResultPayload::Chat {
            text: "too late".to_owned(),
        }))
    }
}

#[fixture]
fn backends() -> Backends {
    Backends::default()
}

async fn trail(harness: &Harness, request_id: RequestId) -> Vec<AuditEntry> {
    harness
        .audit
        .find_by_request(request_id)
        .await
        .expect("audit store readable")
}

fn targets(entries: &[AuditEntry]) -> Vec<PipelineState> {
    entries
        .iter()
        .map(|entry| entry.details().transition.target())
        .collect()
}

fn stalling_harness(config_text: &str) -> Harness {
    let config = OrchestratorConfig::from_toml_str(config_text).expect("valid config");
    harness_with(
        config,
        vec![Arc::new(StallingHandler::new())],
        Arc::new(InMemoryObjectStore::new()),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn presentation_request_is_accepted_first_time(backends: Backends) {
    let harness = harness(&backends);
    let req = request(Role::WriteAccess, "create a 10 slide deck about Q2 results");
    let request_id = req.id();

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Accepted);
    assert_eq!(response.agent_kind_used, Some(AgentKind::Presentation));
    assert_eq!(response.attempts, 1);
    assert!(response.reasons.is_empty());
    assert!(!response.audit_degraded);
    assert_eq!(
        response.tools_used,
        vec!["content_generation".to_owned(), "object_store".to_owned()]
    );

    let reference = response.result_reference.as_deref().expect("artifact reference");
    let key = ObjectKey::parse(reference).expect("valid object key");
    let stored = harness.objects.get(&key).await.expect("artifact stored");
    assert!(!stored.is_empty());

    assert_eq!(outcome.invocations.len(), 1);
    let invocation = outcome.invocations.first().expect("one invocation");
    assert_eq!(invocation.status(), InvocationStatus::Succeeded);
    assert_eq!(invocation.result_ref(), Some(reference));

    let entries = trail(&harness, request_id).await;
    assert_eq!(
        targets(&entries),
        vec![
            PipelineState::Classified,
            PipelineState::AgentSelected,
            PipelineState::Invoking,
            PipelineState::Validating,
            PipelineState::Accepted,
        ]
    );
    let classified = entries.first().expect("classification entry");
    assert_eq!(classified.attempt(), 0);
    assert!(classified.details().confidence.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn document_without_citations_escalates_then_fails(backends: Backends) {
    let harness = harness(&backends);
    let req = request(Role::ReadOnly, "summarize the uploaded document");
    let request_id = req.id();

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Failed);
    assert_eq!(response.reasons, vec!["no citations".to_owned()]);
    assert_eq!(response.attempts, 3);
    assert!(
        outcome
            .invocations
            .iter()
            .all(|invocation| invocation.status() == InvocationStatus::Rejected)
    );

    let scopes: Vec<RetrievalScope> = backends
        .retriever
        .queries()
        .iter()
        .map(|query| query.scope)
        .collect();
    assert_eq!(
        scopes,
        vec![
            RetrievalScope::Attachments,
            RetrievalScope::Collection,
            RetrievalScope::Global,
        ]
    );

    let entries = trail(&harness, request_id).await;
    assert_eq!(entries.len(), 12);
    let retries: Vec<u32> = entries
        .iter()
        .filter(|entry| entry.details().transition.target() == PipelineState::Retrying)
        .map(AuditEntry::attempt)
        .collect();
    assert_eq!(retries, vec![1, 2]);
    let last_two = targets(&entries).split_off(10);
    assert_eq!(last_two, vec![PipelineState::Escalated, PipelineState::Failed]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn financial_missing_field_fails_without_retry() {
    let backends = Backends {
        extractor: Arc::new(ScriptedFieldExtractor::returning([("total_loans", 900.0)])),
        ..Backends::default()
    };
    let harness = harness(&backends);
    let req = request(Role::WriteAccess, "extract the loan portfolio figures");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Failed);
    assert_eq!(response.attempts, 1);
    assert_eq!(
        response.reasons,
        vec!["missing required field: net_interest_margin".to_owned()]
    );
    assert_eq!(backends.extractor.requests().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn financial_extraction_returns_fields(backends: Backends) {
    let harness = harness(&backends);
    let req = request(Role::WriteAccess, "extract the loan portfolio figures");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let fields = outcome.response.fields.expect("fields returned");
    assert_eq!(fields.get("net_interest_margin"), Some(&3.4));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_audit_store_degrades_but_answers(backends: Backends) {
    let harness = harness(&backends);
    harness.audit.set_available(false);
    let req = request(Role::ReadOnly, "hello there, how are you");
    let request_id = req.id();

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    assert_eq!(outcome.response.status, DispatchStatus::Accepted);
    assert_eq!(outcome.response.text.as_deref(), Some("Scripted answer."));
    assert!(outcome.response.audit_degraded);
    let recorder = harness.dispatcher.recorder();
    assert_eq!(recorder.pending_len().await, 5);

    harness.audit.set_available(true);
    let flushed = recorder.reconcile().await.expect("store recovered");

    assert_eq!(flushed, 5);
    assert_eq!(recorder.pending_len().await, 0);
    assert_eq!(trail(&harness, request_id).await.len(), 5);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_web_search_retries_without_search() {
    let backends = Backends {
        search: Arc::new(ScriptedWebSearch::returning(Vec::new()).failing("search offline")),
        ..Backends::default()
    };
    let harness = harness(&backends);
    let req = request(Role::ReadOnly, "what is the latest news today");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Accepted);
    assert_eq!(response.attempts, 2);
    assert_eq!(
        response.tools_used,
        vec!["content_generation".to_owned(), "web_search".to_owned()]
    );
    assert_eq!(backends.search.queries().len(), 1);
    let statuses: Vec<InvocationStatus> = outcome
        .invocations
        .iter()
        .map(|invocation| invocation.status())
        .collect();
    assert_eq!(
        statuses,
        vec![InvocationStatus::Rejected, InvocationStatus::Succeeded]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_failure_detail_stays_out_of_public_reasons() {
    let backends = Backends {
        search: Arc::new(
            ScriptedWebSearch::returning(Vec::new()).failing("db.internal:5432 ECONNREFUSED"),
        ),
        ..Backends::default()
    };
    let objects = Arc::new(InMemoryObjectStore::new());
    let config = OrchestratorConfig::from_toml_str("max_attempts = 1").expect("valid config");
    let harness = harness_with(config, handlers(&backends, &objects), objects);
    let req = request(Role::ReadOnly, "what is the latest news today");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Failed);
    assert_eq!(
        response.reasons,
        vec!["unresolved tool error: web_search".to_owned()]
    );
    assert!(
        response
            .reasons
            .iter()
            .all(|reason| !reason.contains("db.internal"))
    );
    let invocation = outcome.invocations.first().expect("one invocation");
    let feedback = invocation.validator_feedback().expect("rejection detail");
    assert!(feedback.iter().any(|detail| detail.contains("db.internal")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stalled_artifact_lookup_is_bounded_by_the_deadline(backends: Backends) {
    let objects = Arc::new(InMemoryObjectStore::new());
    let config = OrchestratorConfig::from_toml_str(
        r"
max_attempts = 1

[timeouts]
default_agent_ms = 200
",
    )
    .expect("valid config");
    let harness = harness_with(config, handlers(&backends, &objects), objects);
    harness.objects.set_read_delay(Duration::from_secs(3_600));
    let req = request(Role::WriteAccess, "create a 10 slide deck about Q2 results");
    let request_id = req.id();

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        harness.dispatcher.handle(req, CancellationToken::new()),
    )
    .await
    .expect("request finishes within the deadline");

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(
        outcome.response.reasons,
        vec!["request deadline exceeded".to_owned()]
    );
    let invocation = outcome.invocations.first().expect("one invocation");
    assert_eq!(invocation.status(), InvocationStatus::Failed);
    let entries = trail(&harness, request_id).await;
    let last = targets(&entries).pop();
    assert_eq!(last, Some(PipelineState::Failed));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn financial_store_outage_is_a_retryable_storage_failure(backends: Backends) {
    let harness = harness(&backends);
    harness.objects.set_available(false);
    let req = request(Role::WriteAccess, "extract the loan portfolio figures")
        .with_files([FileKey::new("uploads/ana/q2.csv").expect("valid key")]);

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Failed);
    assert_eq!(response.reasons, vec!["artifact storage failed".to_owned()]);
    assert_eq!(response.attempts, 3);
    assert!(
        outcome
            .invocations
            .iter()
            .all(|invocation| invocation.status() == InvocationStatus::Failed)
    );
    assert!(backends.extractor.requests().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreadable_attachment_yields_a_degraded_answer() {
    let backends = Backends {
        retriever: Arc::new(ScriptedRetriever::returning(vec![Passage {
            source_id: "kb-7".to_owned(),
            text: "Refunds are issued within 30 days.".to_owned(),
            score: 0.9,
        }])),
        ..Backends::default()
    };
    let harness = harness(&backends);
    let req = request(Role::ReadOnly, "summarize the uploaded document")
        .with_files([FileKey::new("uploads/ana/missing.pdf").expect("valid key")]);
    let request_id = req.id();

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    let response = &outcome.response;
    assert_eq!(response.status, DispatchStatus::Accepted);
    assert!(response.degraded);
    assert_eq!(response.attempts, 1);

    let entries = trail(&harness, request_id).await;
    let validating = entries
        .iter()
        .find(|entry| entry.details().transition.target() == PipelineState::Validating)
        .expect("validation entry");
    assert!(validating.details().result_degraded);
    let failure = validating
        .details()
        .tool_failures
        .first()
        .expect("recorded tool failure");
    assert_eq!(failure.tool, ToolName::DocumentParser);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn read_only_caller_cannot_create_artifacts(backends: Backends) {
    let harness = harness(&backends);
    let req = request(Role::ReadOnly, "create a 10 slide deck about Q2 results");
    let request_id = req.id();

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.reasons, vec!["insufficient role".to_owned()]);
    assert_eq!(outcome.response.attempts, 0);
    assert!(outcome.invocations.is_empty());
    assert!(backends.model.prompts().is_empty());
    assert_eq!(
        targets(&trail(&harness, request_id).await),
        vec![PipelineState::Classified, PipelineState::Failed]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_kind_fails_without_invocation(backends: Backends) {
    let objects = Arc::new(InMemoryObjectStore::new());
    let config = OrchestratorConfig::from_toml_str(r#"supported_kinds = ["presentation"]"#)
        .expect("valid config");
    let harness = harness_with(config, handlers(&backends, &objects), objects);
    let req = request(Role::ReadOnly, "hello there, how are you");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.reasons, vec!["unsupported kind".to_owned()]);
    assert!(outcome.invocations.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_before_start_records_failure(backends: Backends) {
    let harness = harness(&backends);
    let req = request(Role::WriteAccess, "create a 10 slide deck about Q2 results");
    let request_id = req.id();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = harness.dispatcher.handle(req, cancel).await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.reasons, vec!["request cancelled".to_owned()]);
    let entries = trail(&harness, request_id).await;
    assert_eq!(targets(&entries), vec![PipelineState::Failed]);
    assert!(entries.iter().all(AuditEntry::is_terminal));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancellation_interrupts_a_running_invocation() {
    let harness = stalling_harness("");
    let req = request(Role::ReadOnly, "hello there, how are you");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = harness.dispatcher.handle(req, cancel).await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert_eq!(outcome.response.reasons, vec!["request cancelled".to_owned()]);
    assert_eq!(outcome.invocations.len(), 1);
    let invocation = outcome.invocations.first().expect("one invocation");
    assert_eq!(invocation.status(), InvocationStatus::Failed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn timeouts_count_as_failed_attempts() {
    let harness = stalling_harness(
        r"
max_attempts = 2

[timeouts]
default_agent_ms = 30
",
    );
    let req = request(Role::ReadOnly, "hello there, how are you");

    let outcome = harness.dispatcher.handle(req, CancellationToken::new()).await;

    assert_eq!(outcome.response.status, DispatchStatus::Failed);
    assert!((1..=2).contains(&outcome.invocations.len()));
    assert!(
        outcome
            .invocations
            .iter()
            .all(|invocation| invocation.status() == InvocationStatus::Failed)
    );
    let first = outcome.invocations.first().expect("at least one attempt");
    let feedback = first.validator_feedback().expect("failure detail");
    assert!(feedback.iter().any(|detail| detail.contains("timed out")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submit_rejects_blank_instructions(backends: Backends) {
    let harness = harness(&backends);
    let inbound = InboundRequest {
        instructions: "   ".to_owned(),
        files: Vec::new(),
        mode: RequestMode::default(),
        caller: caller(Role::Admin),
    };

    let err = harness
        .dispatcher
        .submit(inbound, CancellationToken::new())
        .await
        .expect_err("blank instructions are rejected");

    assert!(matches!(err, RequestError::EmptyInstructions));
    assert!(harness.audit.is_empty().expect("store readable"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_requests_keep_separate_trails(backends: Backends) {
    let harness = harness(&backends);
    let first = request(Role::WriteAccess, "create a 10 slide deck about Q2 results");
    let second = request(Role::ReadOnly, "summarize the uploaded document");
    let (first_id, second_id) = (first.id(), second.id());

    let (accepted, failed) = tokio::join!(
        harness.dispatcher.handle(first, CancellationToken::new()),
        harness.dispatcher.handle(second, CancellationToken::new()),
    );

    assert!(accepted.response.is_accepted());
    assert!(!failed.response.is_accepted());
    assert_eq!(trail(&harness, first_id).await.len(), 5);
    assert_eq!(trail(&harness, second_id).await.len(), 12);
    for outcome in [&accepted, &failed] {
        let succeeded = outcome
            .invocations
            .iter()
            .filter(|invocation| invocation.status() == InvocationStatus::Succeeded)
            .count();
        assert_eq!(succeeded, usize::from(outcome.response.is_accepted()));
        assert!(outcome.response.attempts <= 3);
    }
}
