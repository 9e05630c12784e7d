//! Inbound call shape and the structured response returned to callers.

use super::AgentInvocation;
use crate::agent::domain::ResultPayload;
use crate::request::{
    AgentKind, CallerIdentity, FileKey, Request, RequestError, RequestId, RequestMode,
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inbound work request as received from the external surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Free-text instructions.
    pub instructions: String,
    /// Opaque object store keys of attachments.
    pub files: Vec<String>,
    /// Grounding mode.
    pub mode: RequestMode,
    /// Verified caller.
    pub caller: CallerIdentity,
}

impl InboundRequest {
    /// Validates the call and creates an unclassified [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the instructions or a file key are
    /// blank.
    pub fn into_request(self, clock: &impl Clock) -> Result<Request, RequestError> {
        let files = self
            .files
            .into_iter()
            .map(FileKey::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Request::new(self.caller, self.instructions, clock)?
            .with_files(files)
            .with_mode(self.mode))
    }
}

/// Terminal status reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// A candidate result was accepted.
    Accepted,
    /// The request failed; see the reasons.
    Failed,
}

/// Structured response returned for every dispatched request.
///
/// Reasons are public strings only; internal error detail stays in logs
/// and the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchResponse {
    /// The request.
    pub request_id: RequestId,
    /// Terminal status.
    pub status: DispatchStatus,
    /// Handler kind that served the request, once selected.
    pub agent_kind_used: Option<AgentKind>,
    /// Object store key of the produced artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_reference: Option<String>,
    /// Textual answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Extracted numeric fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, f64>>,
    /// De-duplicated external tools used across attempts.
    pub tools_used: Vec<String>,
    /// Public failure reasons; empty when accepted.
    pub reasons: Vec<String>,
    /// Whether the result is best-effort after a failed tool call.
    pub degraded: bool,
    /// Whether any audit write was queued instead of persisted.
    pub audit_degraded: bool,
    /// Number of handler attempts made.
    pub attempts: u32,
}

impl DispatchResponse {
    pub(crate) fn failed(request_id: RequestId, reasons: Vec<String>) -> Self {
        Self {
            request_id,
            status: DispatchStatus::Failed,
            agent_kind_used: None,
            result_reference: None,
            text: None,
            fields: None,
            tools_used: Vec::new(),
            reasons,
            degraded: false,
            audit_degraded: false,
            attempts: 0,
        }
    }

    #[must_use]
    pub(crate) fn with_payload(mut self, payload: &ResultPayload) -> Self {
        match payload {
            ResultPayload::Presentation { artifact, .. } => {
                self.result_reference = Some(artifact.as_str().to_owned());
            }
            ResultPayload::Document { answer, .. } => self.text = Some(answer.clone()),
            ResultPayload::Financial { fields, .. } => self.fields = Some(fields.clone()),
            ResultPayload::Chat { text } => self.text = Some(text.clone()),
        }
        self
    }

    /// Returns whether the request was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.status, DispatchStatus::Accepted)
    }
}

/// Response plus the per-attempt invocation records of one execution.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Response returned to the caller.
    pub response: DispatchResponse,
    /// Invocation records in attempt order.
    pub invocations: Vec<AgentInvocation>,
}
