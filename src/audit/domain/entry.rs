//! Audit entry model.

use crate::agent::domain::ToolFailure;
use crate::dispatch::domain::{InvocationStatus, PipelineState, Transition};
use crate::request::{AgentKind, RequestId, RequestKind, UserId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLogId(Uuid);

impl AuditLogId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for AuditLogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuditLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse category of an audited transition, derived from its target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// The request was classified.
    Classification,
    /// A handler was selected.
    AgentSelection,
    /// A handler invocation started.
    Invocation,
    /// A candidate entered validation.
    Validation,
    /// Another attempt was scheduled.
    Retry,
    /// Retries were abandoned.
    Escalation,
    /// The request reached a terminal state.
    Completion,
}

impl AuditEventType {
    /// Returns the event type recorded for a transition into `target`.
    #[must_use]
    pub const fn for_target(target: PipelineState) -> Self {
        match target {
            PipelineState::Received | PipelineState::Classified => Self::Classification,
            PipelineState::AgentSelected => Self::AgentSelection,
            PipelineState::Invoking => Self::Invocation,
            PipelineState::Validating => Self::Validation,
            PipelineState::Retrying => Self::Retry,
            PipelineState::Escalated => Self::Escalation,
            PipelineState::Accepted | PipelineState::Failed => Self::Completion,
        }
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "classification",
            Self::AgentSelection => "agent_selection",
            Self::Invocation => "invocation",
            Self::Validation => "validation",
            Self::Retry => "retry",
            Self::Escalation => "escalation",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AuditEventType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "classification" => Ok(Self::Classification),
            "agent_selection" => Ok(Self::AgentSelection),
            "invocation" => Ok(Self::Invocation),
            "validation" => Ok(Self::Validation),
            "retry" => Ok(Self::Retry),
            "escalation" => Ok(Self::Escalation),
            "completion" => Ok(Self::Completion),
            other => Err(format!("unknown audit event type: {other}")),
        }
    }
}

/// Structured payload describing one transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDetails {
    /// The audited move.
    pub transition: Transition,
    /// Classified request kind, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_kind: Option<RequestKind>,
    /// Selected handler kind, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_kind: Option<AgentKind>,
    /// Classifier confidence, on classification entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Whether the classifier fell back to its degraded answer.
    #[serde(default)]
    pub classifier_degraded: bool,
    /// Invocation outcome, on post-invocation entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_status: Option<InvocationStatus>,
    /// Rejection or failure reasons.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// External tools used by the attempt.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    /// Whether the validated candidate is best-effort.
    #[serde(default)]
    pub result_degraded: bool,
    /// Tool failures reported by the candidate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_failures: Vec<ToolFailure>,
}

impl TransitionDetails {
    /// Creates details for `transition` with no annotations.
    #[must_use]
    pub const fn new(transition: Transition) -> Self {
        Self {
            transition,
            request_kind: None,
            agent_kind: None,
            confidence: None,
            classifier_degraded: false,
            invocation_status: None,
            reasons: Vec::new(),
            tools_used: Vec::new(),
            result_degraded: false,
            tool_failures: Vec::new(),
        }
    }

    /// Sets the classified request kind.
    #[must_use]
    pub const fn with_request_kind(mut self, kind: RequestKind) -> Self {
        self.request_kind = Some(kind);
        self
    }

    /// Sets the handler kind.
    #[must_use]
    pub const fn with_agent_kind(mut self, kind: AgentKind) -> Self {
        self.agent_kind = Some(kind);
        self
    }

    /// Sets classifier confidence and degradation.
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f64, degraded: bool) -> Self {
        self.confidence = Some(confidence);
        self.classifier_degraded = degraded;
        self
    }

    /// Sets the invocation outcome.
    #[must_use]
    pub const fn with_invocation_status(mut self, status: InvocationStatus) -> Self {
        self.invocation_status = Some(status);
        self
    }

    /// Sets the reasons.
    #[must_use]
    pub fn with_reasons(mut self, reasons: Vec<String>) -> Self {
        self.reasons = reasons;
        self
    }

    /// Sets the tools used.
    #[must_use]
    pub fn with_tools_used(mut self, tools: Vec<String>) -> Self {
        self.tools_used = tools;
        self
    }

    /// Sets candidate degradation and the tool failures behind it.
    #[must_use]
    pub fn with_degradation(mut self, degraded: bool, failures: Vec<ToolFailure>) -> Self {
        self.result_degraded = degraded;
        self.tool_failures = failures;
        self
    }

    /// Returns the handler kind, falling back to the classified kind.
    #[must_use]
    pub fn effective_agent_kind(&self) -> Option<AgentKind> {
        self.agent_kind
            .or_else(|| self.request_kind.and_then(RequestKind::agent_kind))
    }
}

/// Deduplication key for at-least-once audit delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    /// Owning request.
    pub request_id: RequestId,
    /// Attempt number; zero before the first invocation.
    pub attempt: u32,
    /// Transition label.
    pub action: String,
}

/// Dispatcher-side description of a transition to audit.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRecord {
    /// Owning request.
    pub request_id: RequestId,
    /// Caller that issued the request.
    pub user_id: UserId,
    /// Attempt number; zero before the first invocation.
    pub attempt: u32,
    /// Monotonic per-request sequence number.
    pub sequence: u64,
    /// Transition payload.
    pub details: TransitionDetails,
}

/// Stored representation used when rehydrating entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedAuditEntry {
    /// Entry identifier.
    pub log_id: AuditLogId,
    /// Write timestamp.
    pub timestamp: DateTime<Utc>,
    /// Caller that issued the request.
    pub user_id: UserId,
    /// Transition label.
    pub action: String,
    /// Audited resource path.
    pub resource: String,
    /// Event category.
    pub event_type: AuditEventType,
    /// Owning request.
    pub request_id: RequestId,
    /// Attempt number.
    pub attempt: u32,
    /// Per-request sequence number.
    pub sequence: u64,
    /// Transition payload.
    pub details: TransitionDetails,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}

/// One immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    log_id: AuditLogId,
    timestamp: DateTime<Utc>,
    user_id: UserId,
    action: String,
    resource: String,
    event_type: AuditEventType,
    request_id: RequestId,
    attempt: u32,
    sequence: u64,
    details: TransitionDetails,
    expires_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped at `timestamp`, expiring after `retention`.
    #[must_use]
    pub fn new(record: TransitionRecord, timestamp: DateTime<Utc>, retention: Duration) -> Self {
        let TransitionRecord {
            request_id,
            user_id,
            attempt,
            sequence,
            details,
        } = record;
        let expires_at = timestamp
            .checked_add_signed(retention)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            log_id: AuditLogId::new(),
            timestamp,
            user_id,
            action: details.transition.label(),
            resource: format!("request/{request_id}"),
            event_type: AuditEventType::for_target(details.transition.target()),
            request_id,
            attempt,
            sequence,
            details,
            expires_at,
        }
    }

    /// Rehydrates an entry from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAuditEntry) -> Self {
        Self {
            log_id: data.log_id,
            timestamp: data.timestamp,
            user_id: data.user_id,
            action: data.action,
            resource: data.resource,
            event_type: data.event_type,
            request_id: data.request_id,
            attempt: data.attempt,
            sequence: data.sequence,
            details: data.details,
            expires_at: data.expires_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn log_id(&self) -> AuditLogId {
        self.log_id
    }

    /// Returns the write timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the caller.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the transition label.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the audited resource path.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the event category.
    #[must_use]
    pub const fn event_type(&self) -> AuditEventType {
        self.event_type
    }

    /// Returns the owning request.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the attempt number.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the per-request sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the transition payload.
    #[must_use]
    pub const fn details(&self) -> &TransitionDetails {
        &self.details
    }

    /// Returns the retention expiry.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns the deduplication key.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            request_id: self.request_id,
            attempt: self.attempt,
            action: self.action.clone(),
        }
    }

    /// Returns whether the entry records a terminal transition.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.details.transition.target().is_terminal()
    }
}
