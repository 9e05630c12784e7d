//! Request aggregate and attachment references.

use super::{CallerIdentity, RequestError, RequestId, RequestKind};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an attachment held by the object store.
///
/// The orchestrator never retains attachment bytes; handlers resolve keys
/// through the object store port when they need content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(String);

impl FileKey {
    /// Creates a validated file key.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyFileKey`] when the key is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, RequestError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyFileKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final path segment of the key.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the lowercase extension of the final path segment, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        name.rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .filter(|extension| !extension.is_empty())
    }

    /// Returns a best-effort MIME type derived from the file extension.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pptx") => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Some("csv") => "text/csv",
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("md") => "text/markdown",
            Some("json") => "application/json",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answer grounding mode requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestMode {
    /// Answers must cite retrieved sources.
    #[default]
    Grounded,
    /// The caller accepts answers without citations.
    Freeform,
}

impl RequestMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::Freeform => "freeform",
        }
    }
}

/// Inbound work request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    caller: CallerIdentity,
    instructions: String,
    files: Vec<FileKey>,
    mode: RequestMode,
    created_at: DateTime<Utc>,
    kind: Option<RequestKind>,
}

impl Request {
    /// Creates a new unclassified request.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyInstructions`] when the instructions are
    /// blank.
    pub fn new(
        caller: CallerIdentity,
        instructions: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, RequestError> {
        let raw = instructions.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyInstructions);
        }
        Ok(Self {
            id: RequestId::new(),
            caller,
            instructions: trimmed.to_owned(),
            files: Vec::new(),
            mode: RequestMode::default(),
            created_at: clock.utc(),
            kind: None,
        })
    }

    /// Sets attached file keys.
    #[must_use]
    pub fn with_files(mut self, files: impl IntoIterator<Item = FileKey>) -> Self {
        self.files = files.into_iter().collect();
        self
    }

    /// Sets the grounding mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the verified caller identity.
    #[must_use]
    pub const fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    /// Returns the free-text instructions.
    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Returns the attached file keys.
    #[must_use]
    pub fn files(&self) -> &[FileKey] {
        &self.files
    }

    /// Returns the requested grounding mode.
    #[must_use]
    pub const fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the classified kind, or `None` before classification.
    #[must_use]
    pub const fn kind(&self) -> Option<RequestKind> {
        self.kind
    }

    /// Returns the content types of all attachments, in attachment order.
    #[must_use]
    pub fn content_types(&self) -> Vec<&'static str> {
        self.files.iter().map(FileKey::content_type).collect()
    }

    /// Records the classified kind.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::AlreadyClassified`] when a kind is already
    /// set; classification happens once per request.
    pub fn classify(&mut self, kind: RequestKind) -> Result<(), RequestError> {
        if self.kind.is_some() {
            return Err(RequestError::AlreadyClassified(self.id));
        }
        self.kind = Some(kind);
        Ok(())
    }
}
