//! Filters for the audit query surface.

use super::AuditEntry;
use crate::request::UserId;
use chrono::{DateTime, Utc};

/// Filter over audit entries by user, action, and time window.
///
/// Results are returned newest first. The time window is half-open:
/// `since` is inclusive and `until` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditQuery {
    user_id: Option<UserId>,
    action: Option<String>,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    limit: Option<usize>,
}

impl AuditQuery {
    /// Creates an unfiltered query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to one caller.
    #[must_use]
    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Restricts results to one transition label.
    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Restricts results to entries at or after `since`.
    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restricts results to entries before `until`.
    #[must_use]
    pub const fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Caps the number of returned entries.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the caller filter.
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Returns the action filter.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn since_bound(&self) -> Option<DateTime<Utc>> {
        self.since
    }

    /// Returns the exclusive upper bound.
    #[must_use]
    pub const fn until_bound(&self) -> Option<DateTime<Utc>> {
        self.until
    }

    /// Returns the result cap.
    #[must_use]
    pub const fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Returns whether `entry` satisfies every filter.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.user_id.as_ref().is_none_or(|user| entry.user_id() == user)
            && self.action.as_deref().is_none_or(|action| entry.action() == action)
            && self.since.is_none_or(|since| entry.timestamp() >= since)
            && self.until.is_none_or(|until| entry.timestamp() < until)
    }
}
