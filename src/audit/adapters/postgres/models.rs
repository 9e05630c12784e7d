//! Diesel row models for audit persistence.

use super::schema::audit_entries;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for audit entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AuditEntryRow {
    /// Entry identifier.
    pub log_id: uuid::Uuid,
    /// Owning request.
    pub request_id: uuid::Uuid,
    /// Attempt number.
    pub attempt: i32,
    /// Per-request sequence.
    pub sequence: i64,
    /// Caller identifier.
    pub user_id: String,
    /// Transition label.
    pub action: String,
    /// Audited resource path.
    pub resource: String,
    /// Event category.
    pub event_type: String,
    /// Structured transition payload.
    pub details: Value,
    /// Write timestamp.
    pub recorded_at: DateTime<Utc>,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}

/// Insert model for audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_entries)]
pub struct NewAuditEntryRow {
    /// Entry identifier.
    pub log_id: uuid::Uuid,
    /// Owning request.
    pub request_id: uuid::Uuid,
    /// Attempt number.
    pub attempt: i32,
    /// Per-request sequence.
    pub sequence: i64,
    /// Caller identifier.
    pub user_id: String,
    /// Transition label.
    pub action: String,
    /// Audited resource path.
    pub resource: String,
    /// Event category.
    pub event_type: String,
    /// Structured transition payload.
    pub details: Value,
    /// Write timestamp.
    pub recorded_at: DateTime<Utc>,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}
