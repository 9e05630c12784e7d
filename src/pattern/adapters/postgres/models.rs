//! Diesel row models for pattern persistence.

use super::schema::patterns;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for patterns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = patterns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PatternRow {
    /// Pattern identifier.
    pub pattern_id: uuid::Uuid,
    /// Analyzer run timestamp.
    pub discovered_at: DateTime<Utc>,
    /// Aggregate type.
    pub pattern_type: String,
    /// Described agent kind.
    pub agent_kind: Option<String>,
    /// Human-readable summary.
    pub description: String,
    /// Evidence strength.
    pub confidence_score: f64,
    /// Measured value.
    pub metric: Value,
    /// Sample size.
    pub sample_size: i32,
    /// Supporting request identifiers.
    pub evidence: Value,
    /// Replaced pattern.
    pub supersedes: Option<uuid::Uuid>,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}

/// Insert model for patterns.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = patterns)]
pub struct NewPatternRow {
    /// Pattern identifier.
    pub pattern_id: uuid::Uuid,
    /// Analyzer run timestamp.
    pub discovered_at: DateTime<Utc>,
    /// Aggregate type.
    pub pattern_type: String,
    /// Described agent kind.
    pub agent_kind: Option<String>,
    /// Human-readable summary.
    pub description: String,
    /// Evidence strength.
    pub confidence_score: f64,
    /// Measured value.
    pub metric: Value,
    /// Sample size.
    pub sample_size: i32,
    /// Supporting request identifiers.
    pub evidence: Value,
    /// Replaced pattern.
    pub supersedes: Option<uuid::Uuid>,
    /// Retention expiry.
    pub expires_at: DateTime<Utc>,
}
