//! Admin read surface over the audit trail and pattern insights.

use std::sync::Arc;

use mockable::Clock;

use super::gate::{AccessResult, require_role};
use crate::audit::{
    domain::{AuditEntry, AuditQuery},
    ports::AuditStore,
};
use crate::pattern::{domain::InsightSummary, ports::PatternStore};
use crate::request::{CallerIdentity, RequestId, Role};

/// Read-only queries restricted to [`Role::Admin`] callers.
pub struct AuditQueryService<A, P, C>
where
    A: AuditStore,
    P: PatternStore,
    C: Clock + Send + Sync,
{
    audit: Arc<A>,
    patterns: Arc<P>,
    clock: Arc<C>,
    alert_threshold: f64,
}

impl<A, P, C> AuditQueryService<A, P, C>
where
    A: AuditStore,
    P: PatternStore,
    C: Clock + Send + Sync,
{
    /// Creates the service. `alert_threshold` is the rejection rate above
    /// which insights recommend attention for a kind.
    #[must_use]
    pub const fn new(audit: Arc<A>, patterns: Arc<P>, clock: Arc<C>, alert_threshold: f64) -> Self {
        Self {
            audit,
            patterns,
            clock,
            alert_threshold,
        }
    }

    /// Lists audit entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::AccessError::Forbidden`] for non-admin callers and
    /// [`super::AccessError::Audit`] when the store fails.
    pub async fn recent_entries(
        &self,
        caller: &CallerIdentity,
        query: &AuditQuery,
    ) -> AccessResult<Vec<AuditEntry>> {
        require_role(caller, Role::Admin)?;
        Ok(self.audit.query(query).await?)
    }

    /// Returns the full audit trail of one request in pipeline order.
    ///
    /// # Errors
    ///
    /// Returns [`super::AccessError::Forbidden`] for non-admin callers and
    /// [`super::AccessError::Audit`] when the store fails.
    pub async fn request_trail(
        &self,
        caller: &CallerIdentity,
        request_id: RequestId,
    ) -> AccessResult<Vec<AuditEntry>> {
        require_role(caller, Role::Admin)?;
        Ok(self.audit.find_by_request(request_id).await?)
    }

    /// Summarizes the current pattern insights.
    ///
    /// # Errors
    ///
    /// Returns [`super::AccessError::Forbidden`] for non-admin callers and
    /// [`super::AccessError::Patterns`] when the store fails.
    pub async fn insights(&self, caller: &CallerIdentity) -> AccessResult<InsightSummary> {
        require_role(caller, Role::Admin)?;
        let current = self.patterns.current(self.clock.utc()).await?;
        Ok(InsightSummary::from_patterns(&current, self.alert_threshold))
    }
}
