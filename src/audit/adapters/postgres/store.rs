//! `PostgreSQL` audit store.

use super::{
    models::{AuditEntryRow, NewAuditEntryRow},
    schema::audit_entries,
};
use crate::audit::{
    domain::{AuditEntry, AuditEventType, AuditLogId, AuditQuery, PersistedAuditEntry},
    ports::{AppendOutcome, AuditStore, AuditStoreError, AuditStoreResult},
};
use crate::request::{RequestId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// `PostgreSQL` connection pool type used by audit and pattern adapters.
pub type AuditPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed audit store.
///
/// Deduplication relies on the unique index over
/// `(request_id, attempt, action)`; conflicting inserts are skipped.
#[derive(Debug, Clone)]
pub struct PostgresAuditStore {
    pool: AuditPgPool,
}

impl PostgresAuditStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: AuditPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AuditStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AuditStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| AuditStoreError::Unavailable(err.to_string()))?;
            f(&mut connection)
        })
        .await
        .map_err(AuditStoreError::persistence)?
    }
}

#[async_trait]
impl AuditStore for PostgresAuditStore {
    async fn append(&self, entry: &AuditEntry) -> AuditStoreResult<AppendOutcome> {
        let new_row = to_new_row(entry)?;
        self.run_blocking(move |connection| {
            let inserted = diesel::insert_into(audit_entries::table)
                .values(&new_row)
                .on_conflict((
                    audit_entries::request_id,
                    audit_entries::attempt,
                    audit_entries::action,
                ))
                .do_nothing()
                .execute(connection)
                .map_err(AuditStoreError::persistence)?;
            Ok(if inserted == 0 {
                AppendOutcome::Duplicate
            } else {
                AppendOutcome::Inserted
            })
        })
        .await
    }

    async fn query(&self, query: &AuditQuery) -> AuditStoreResult<Vec<AuditEntry>> {
        let filter = query.clone();
        self.run_blocking(move |connection| {
            let mut statement = audit_entries::table
                .select(AuditEntryRow::as_select())
                .into_boxed();
            if let Some(user) = filter.user_id() {
                statement = statement.filter(audit_entries::user_id.eq(user.as_str().to_owned()));
            }
            if let Some(action) = filter.action() {
                statement = statement.filter(audit_entries::action.eq(action.to_owned()));
            }
            if let Some(since) = filter.since_bound() {
                statement = statement.filter(audit_entries::recorded_at.ge(since));
            }
            if let Some(until) = filter.until_bound() {
                statement = statement.filter(audit_entries::recorded_at.lt(until));
            }
            statement = statement.order((
                audit_entries::recorded_at.desc(),
                audit_entries::sequence.desc(),
            ));
            if let Some(limit) = filter.max_results() {
                let bounded = i64::try_from(limit).unwrap_or(i64::MAX);
                statement = statement.limit(bounded);
            }
            let rows = statement
                .load::<AuditEntryRow>(connection)
                .map_err(AuditStoreError::persistence)?;
            rows.into_iter().map(row_to_entry).collect()
        })
        .await
    }

    async fn find_by_request(&self, request_id: RequestId) -> AuditStoreResult<Vec<AuditEntry>> {
        self.run_blocking(move |connection| {
            let rows = audit_entries::table
                .filter(audit_entries::request_id.eq(request_id.into_inner()))
                .order((
                    audit_entries::attempt.asc(),
                    audit_entries::recorded_at.asc(),
                    audit_entries::sequence.asc(),
                ))
                .select(AuditEntryRow::as_select())
                .load::<AuditEntryRow>(connection)
                .map_err(AuditStoreError::persistence)?;
            rows.into_iter().map(row_to_entry).collect()
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuditStoreResult<u64> {
        self.run_blocking(move |connection| {
            let deleted =
                diesel::delete(audit_entries::table.filter(audit_entries::expires_at.le(now)))
                    .execute(connection)
                    .map_err(AuditStoreError::persistence)?;
            u64::try_from(deleted).map_err(AuditStoreError::persistence)
        })
        .await
    }
}

fn to_new_row(entry: &AuditEntry) -> AuditStoreResult<NewAuditEntryRow> {
    let details = serde_json::to_value(entry.details()).map_err(AuditStoreError::persistence)?;
    Ok(NewAuditEntryRow {
        log_id: entry.log_id().into_inner(),
        request_id: entry.request_id().into_inner(),
        attempt: i32::try_from(entry.attempt()).map_err(AuditStoreError::persistence)?,
        sequence: i64::try_from(entry.sequence()).map_err(AuditStoreError::persistence)?,
        user_id: entry.user_id().as_str().to_owned(),
        action: entry.action().to_owned(),
        resource: entry.resource().to_owned(),
        event_type: entry.event_type().as_str().to_owned(),
        details,
        recorded_at: entry.timestamp(),
        expires_at: entry.expires_at(),
    })
}

fn row_to_entry(row: AuditEntryRow) -> AuditStoreResult<AuditEntry> {
    let AuditEntryRow {
        log_id,
        request_id,
        attempt,
        sequence,
        user_id,
        action,
        resource,
        event_type: persisted_event_type,
        details: persisted_details,
        recorded_at,
        expires_at,
    } = row;

    let event_type = AuditEventType::try_from(persisted_event_type.as_str())
        .map_err(|err| AuditStoreError::persistence(std::io::Error::other(err)))?;
    let details =
        serde_json::from_value(persisted_details).map_err(AuditStoreError::persistence)?;

    Ok(AuditEntry::from_persisted(PersistedAuditEntry {
        log_id: AuditLogId::from_uuid(log_id),
        timestamp: recorded_at,
        user_id: UserId::new(user_id).map_err(AuditStoreError::persistence)?,
        action,
        resource,
        event_type,
        request_id: RequestId::from_uuid(request_id),
        attempt: u32::try_from(attempt).map_err(AuditStoreError::persistence)?,
        sequence: u64::try_from(sequence).map_err(AuditStoreError::persistence)?,
        details,
        expires_at,
    }))
}
