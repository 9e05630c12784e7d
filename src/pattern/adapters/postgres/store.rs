//! `PostgreSQL` pattern store.

use super::{
    models::{NewPatternRow, PatternRow},
    schema::patterns,
};
use crate::pattern::{
    domain::{Pattern, PatternId, PatternType, PersistedPattern},
    ports::{PatternStore, PatternStoreError, PatternStoreResult},
};
use crate::request::AgentKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashSet;

/// `PostgreSQL` connection pool type used by pattern adapters.
pub type PatternPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed pattern store.
#[derive(Debug, Clone)]
pub struct PostgresPatternStore {
    pool: PatternPgPool,
}

impl PostgresPatternStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PatternPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> PatternStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> PatternStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| PatternStoreError::Unavailable(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(PatternStoreError::persistence)?
    }
}

#[async_trait]
impl PatternStore for PostgresPatternStore {
    async fn insert(&self, pattern: &Pattern) -> PatternStoreResult<()> {
        let pattern_id = pattern.id();
        let new_row = to_new_row(pattern)?;
        self.run_blocking(move |connection| {
            diesel::insert_into(patterns::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PatternStoreError::Duplicate(pattern_id)
                    }
                    _ => PatternStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn latest(
        &self,
        pattern_type: PatternType,
        agent_kind: Option<AgentKind>,
    ) -> PatternStoreResult<Option<Pattern>> {
        self.run_blocking(move |connection| {
            let mut statement = patterns::table
                .filter(patterns::pattern_type.eq(pattern_type.as_str()))
                .select(PatternRow::as_select())
                .into_boxed();
            statement = match agent_kind {
                Some(kind) => statement.filter(patterns::agent_kind.eq(kind.as_str())),
                None => statement.filter(patterns::agent_kind.is_null()),
            };
            let row = statement
                .order(patterns::discovered_at.desc())
                .first::<PatternRow>(connection)
                .optional()
                .map_err(PatternStoreError::persistence)?;
            row.map(row_to_pattern).transpose()
        })
        .await
    }

    async fn current(&self, now: DateTime<Utc>) -> PatternStoreResult<Vec<Pattern>> {
        self.run_blocking(move |connection| {
            let superseded: HashSet<uuid::Uuid> = patterns::table
                .filter(patterns::supersedes.is_not_null())
                .select(patterns::supersedes)
                .load::<Option<uuid::Uuid>>(connection)
                .map_err(PatternStoreError::persistence)?
                .into_iter()
                .flatten()
                .collect();
            let rows = patterns::table
                .filter(patterns::expires_at.gt(now))
                .order(patterns::discovered_at.desc())
                .select(PatternRow::as_select())
                .load::<PatternRow>(connection)
                .map_err(PatternStoreError::persistence)?;
            rows.into_iter()
                .filter(|row| !superseded.contains(&row.pattern_id))
                .map(row_to_pattern)
                .collect()
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> PatternStoreResult<u64> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(patterns::table.filter(patterns::expires_at.le(now)))
                .execute(connection)
                .map_err(PatternStoreError::persistence)?;
            u64::try_from(deleted).map_err(PatternStoreError::persistence)
        })
        .await
    }
}

fn to_new_row(pattern: &Pattern) -> PatternStoreResult<NewPatternRow> {
    Ok(NewPatternRow {
        pattern_id: pattern.id().into_inner(),
        discovered_at: pattern.discovered_at(),
        pattern_type: pattern.pattern_type().as_str().to_owned(),
        agent_kind: pattern.agent_kind().map(|kind| kind.as_str().to_owned()),
        description: pattern.description().to_owned(),
        confidence_score: pattern.confidence_score(),
        metric: serde_json::to_value(pattern.metric()).map_err(PatternStoreError::persistence)?,
        sample_size: i32::try_from(pattern.sample_size())
            .map_err(PatternStoreError::persistence)?,
        evidence: serde_json::to_value(pattern.evidence())
            .map_err(PatternStoreError::persistence)?,
        supersedes: pattern.supersedes().map(PatternId::into_inner),
        expires_at: pattern.expires_at(),
    })
}

fn row_to_pattern(row: PatternRow) -> PatternStoreResult<Pattern> {
    let PatternRow {
        pattern_id,
        discovered_at,
        agent_kind: persisted_kind,
        description,
        confidence_score,
        metric: persisted_metric,
        sample_size,
        evidence: persisted_evidence,
        supersedes,
        expires_at,
        ..
    } = row;

    let agent_kind = persisted_kind
        .as_deref()
        .map(AgentKind::try_from)
        .transpose()
        .map_err(PatternStoreError::persistence)?;

    Ok(Pattern::from_persisted(PersistedPattern {
        id: PatternId::from_uuid(pattern_id),
        discovered_at,
        agent_kind,
        description,
        confidence_score,
        metric: serde_json::from_value(persisted_metric)
            .map_err(PatternStoreError::persistence)?,
        sample_size: u32::try_from(sample_size).map_err(PatternStoreError::persistence)?,
        evidence: serde_json::from_value(persisted_evidence)
            .map_err(PatternStoreError::persistence)?,
        supersedes: supersedes.map(PatternId::from_uuid),
        expires_at,
    }))
}
