//! Error types for request construction and parsing.

use super::RequestId;
use thiserror::Error;

/// Errors returned while constructing or mutating request values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The request instructions are empty after trimming.
    #[error("request instructions must not be empty")]
    EmptyInstructions,

    /// The caller user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// A file key is empty after trimming.
    #[error("file key must not be empty")]
    EmptyFileKey,

    /// The role string does not name a known role.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// The kind string does not name a known request kind.
    #[error("unknown request kind: {0}")]
    UnknownKind(String),

    /// The request already carries a classified kind.
    #[error("request {0} has already been classified")]
    AlreadyClassified(RequestId),
}
