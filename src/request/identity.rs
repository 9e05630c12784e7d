//! Verified caller identity and role ordering.

use super::RequestError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyUserId`] when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, RequestError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyUserId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authorization role, ordered from least to most privileged.
///
/// Write actions require at least [`Role::WriteAccess`]; audit and pattern
/// views require [`Role::Admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May read and converse but not create artifacts.
    ReadOnly,
    /// May submit requests that create artifacts.
    WriteAccess,
    /// May additionally inspect audit trails and pattern insights.
    Admin,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::WriteAccess => "write_access",
            Self::Admin => "admin",
        }
    }

    /// Returns whether this role satisfies the `required` role.
    #[must_use]
    pub fn permits(self, required: Self) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = RequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "read_only" | "readonly" => Ok(Self::ReadOnly),
            "write_access" | "write" => Ok(Self::WriteAccess),
            "admin" => Ok(Self::Admin),
            _ => Err(RequestError::UnknownRole(value.to_owned())),
        }
    }
}

/// A verified `{user_id, role}` pair supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    user_id: UserId,
    role: Role,
}

impl CallerIdentity {
    /// Creates a caller identity.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Returns the caller's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the caller's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}
