//! Mutable state of one dispatcher execution.

use crate::audit::{
    domain::{TransitionDetails, TransitionRecord},
    ports::AuditStore,
    services::AuditRecorder,
};
use crate::dispatch::domain::{
    AgentInvocation, DispatchDomainError, DispatchResponse, DispatchStatus, PipelineState,
};
use crate::request::{AgentKind, Request, UserId};
use mockable::Clock;
use std::collections::BTreeSet;
use tracing::debug;

/// Per-request pipeline position, audit sequence, and attempt records.
///
/// Owned by exactly one dispatcher execution; never shared.
pub(super) struct Execution<'a, A, C>
where
    A: AuditStore,
    C: Clock + Send + Sync,
{
    recorder: &'a AuditRecorder<A, C>,
    user_id: UserId,
    state: PipelineState,
    sequence: u64,
    last_attempt: u32,
    audit_degraded: bool,
    agent_kind: Option<AgentKind>,
    tools_used: BTreeSet<&'static str>,
    invocations: Vec<AgentInvocation>,
}

impl<'a, A, C> Execution<'a, A, C>
where
    A: AuditStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    pub(super) fn new(recorder: &'a AuditRecorder<A, C>, request: &Request) -> Self {
        Self {
            recorder,
            user_id: request.caller().user_id().clone(),
            state: PipelineState::Received,
            sequence: 0,
            last_attempt: 0,
            audit_degraded: false,
            agent_kind: None,
            tools_used: BTreeSet::new(),
            invocations: Vec::new(),
        }
    }

    pub(super) const fn state(&self) -> PipelineState {
        self.state
    }

    pub(super) const fn last_attempt(&self) -> u32 {
        self.last_attempt
    }

    pub(super) const fn select(&mut self, kind: AgentKind) {
        self.agent_kind = Some(kind);
    }

    pub(super) fn note_tools(&mut self, tools: impl IntoIterator<Item = &'static str>) {
        self.tools_used.extend(tools);
    }

    pub(super) fn push_invocation(&mut self, invocation: AgentInvocation) {
        self.invocations.push(invocation);
    }

    /// Moves to `target` and records one audit entry for the move.
    ///
    /// `annotate` decorates the transition details; the selected kind is
    /// filled in when the annotation leaves it unset.
    pub(super) async fn advance<F>(
        &mut self,
        request: &Request,
        target: PipelineState,
        attempt: u32,
        annotate: F,
    ) -> Result<(), DispatchDomainError>
    where
        F: FnOnce(TransitionDetails) -> TransitionDetails + Send,
    {
        let transition = self.state.transition(target)?;
        let mut annotated = annotate(TransitionDetails::new(transition));
        if annotated.agent_kind.is_none() {
            annotated.agent_kind = self.agent_kind;
        }
        let record = TransitionRecord {
            request_id: request.id(),
            user_id: self.user_id.clone(),
            attempt,
            sequence: self.sequence,
            details: annotated,
        };
        self.sequence = self.sequence.saturating_add(1);
        let outcome = self.recorder.record(record).await;
        self.audit_degraded = self.audit_degraded || outcome.is_degraded();
        debug!(
            request_id = %request.id(),
            attempt,
            from = %self.state,
            to = %target,
            "pipeline transition"
        );
        self.state = target;
        self.last_attempt = self.last_attempt.max(attempt);
        Ok(())
    }

    /// Builds the caller response and hands back the invocation records.
    pub(super) fn finish(
        self,
        request: &Request,
        status: DispatchStatus,
        reasons: Vec<String>,
    ) -> (DispatchResponse, Vec<AgentInvocation>) {
        let attempts = u32::try_from(self.invocations.len()).unwrap_or(u32::MAX);
        let response = DispatchResponse {
            status,
            agent_kind_used: self.agent_kind,
            tools_used: self.tools_used.into_iter().map(str::to_owned).collect(),
            audit_degraded: self.audit_degraded,
            attempts,
            ..DispatchResponse::failed(request.id(), reasons)
        };
        (response, self.invocations)
    }
}
