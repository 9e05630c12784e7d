//! Object store keys and artifact key layout.

use crate::request::{FileKey, RequestId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of an object in the artifact store.
///
/// Keys are `/`-separated relative paths with no empty, `.` or `..`
/// segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Creates a validated object key.
    ///
    /// Returns `None` when the key is empty, absolute, or contains empty,
    /// `.` or `..` segments.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let valid = !trimmed.is_empty()
            && trimmed
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        valid.then(|| Self(trimmed.to_owned()))
    }

    /// Builds the artifact key `{scope}/{user}/{request}/{file_name}`.
    ///
    /// The user identifier and file name are sanitized so the key stays a
    /// plain relative path.
    ///
    /// # Examples
    ///
    /// ```
    /// use scriptorium::agent::domain::ObjectKey;
    /// use scriptorium::request::{RequestId, UserId};
    ///
    /// let user = UserId::new("ana").expect("valid user id");
    /// let request = RequestId::new();
    /// let key = ObjectKey::artifact("artifacts", &user, request, "Q2 review.deck.json");
    /// assert!(key.as_str().ends_with("/Q2_review.deck.json"));
    /// ```
    #[must_use]
    pub fn artifact(scope: &str, user: &UserId, request: RequestId, file_name: &str) -> Self {
        Self(format!(
            "{}/{}/{}/{}",
            sanitize_file_name(scope),
            sanitize_file_name(user.as_str()),
            request,
            sanitize_file_name(file_name),
        ))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final path segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the key of the `n`th version: `{stem}_v{n}.{ext}`.
    ///
    /// The extension is everything after the first `.` of the file name, so
    /// `deck.tar.gz` becomes `deck_v2.tar.gz`.
    #[must_use]
    pub fn versioned(&self, n: u32) -> Self {
        let (directory, name) = match self.0.rsplit_once('/') {
            Some((directory, name)) => (Some(directory), name),
            None => (None, self.0.as_str()),
        };
        let renamed = match name.split_once('.') {
            Some((stem, extension)) if !stem.is_empty() => format!("{stem}_v{n}.{extension}"),
            _ => format!("{name}_v{n}"),
        };
        match directory {
            Some(directory) => Self(format!("{directory}/{renamed}")),
            None => Self(renamed),
        }
    }

    /// Returns whether this key lies under `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&FileKey> for ObjectKey {
    type Error = String;

    fn try_from(value: &FileKey) -> Result<Self, Self::Error> {
        Self::parse(value.as_str()).ok_or_else(|| format!("invalid object key: {value}"))
    }
}

/// Reduces `name` to alphanumerics, `-`, `_`, and `.`, with spaces mapped
/// to `_`. A name with nothing left becomes `unnamed`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter_map(|ch| match ch {
            ' ' => Some('_'),
            ch if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') => Some(ch),
            _ => None,
        })
        .collect();
    let without_dots = cleaned.trim_start_matches('.');
    if without_dots.is_empty() {
        "unnamed".to_owned()
    } else {
        without_dots.to_owned()
    }
}
