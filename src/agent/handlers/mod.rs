//! The four agent handler variants.
//!
//! Handlers compose backend ports and hold no per-request state; every
//! backend call runs under the handler's per-call timeout.

mod chat;
mod document;
mod financial;
mod presentation;

pub use chat::ChatHandler;
pub use document::DocumentHandler;
pub use financial::FinancialHandler;
pub use presentation::{PresentationHandler, requested_slide_count};

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::agent::{
    domain::{ObjectKey, ToolFailure, ToolName},
    ports::{BackendError, BackendResult, ObjectStore, ObjectStoreResult, StorageError},
};
use crate::request::FileKey;

/// Upper bound on characters taken from one attachment.
const EXCERPT_CHAR_LIMIT: usize = 8_000;

/// Runs a backend call under `timeout`.
async fn call<T>(
    backend: &'static str,
    timeout: Duration,
    operation: impl Future<Output = BackendResult<T>>,
) -> BackendResult<T> {
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| BackendError::Timeout { backend })?
}

/// Text extracted from one attachment.
#[derive(Debug, Clone, Serialize)]
struct Excerpt {
    name: String,
    text: String,
}

/// Attachment parsing outcome; failures are kept rather than aborting.
#[derive(Debug, Default)]
struct ParsedAttachments {
    excerpts: Vec<Excerpt>,
    failures: Vec<ToolFailure>,
}

impl ParsedAttachments {
    fn joined_text(&self) -> String {
        self.excerpts
            .iter()
            .map(|excerpt| excerpt.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reads attachment bytes from the object store and decodes them as text.
///
/// Missing or malformed attachments become per-file failures.
///
/// # Errors
///
/// Returns the [`StorageError`] when the store itself is unreachable or
/// slow, so the attempt fails as a retryable storage failure.
async fn parse_attachments<S>(
    store: &S,
    files: &[FileKey],
    timeout: Duration,
) -> ObjectStoreResult<ParsedAttachments>
where
    S: ObjectStore + ?Sized,
{
    let mut parsed = ParsedAttachments::default();
    for file in files {
        let outcome = match ObjectKey::try_from(file) {
            Ok(key) => read_attachment(store, &key, timeout).await?,
            Err(reason) => Err(reason),
        };
        match outcome {
            Ok(bytes) => parsed.excerpts.push(Excerpt {
                name: file.file_name().to_owned(),
                text: String::from_utf8_lossy(&bytes)
                    .chars()
                    .take(EXCERPT_CHAR_LIMIT)
                    .collect(),
            }),
            Err(message) => {
                warn!(file = %file, error = %message, "attachment could not be parsed");
                parsed.failures.push(ToolFailure {
                    tool: ToolName::DocumentParser,
                    message,
                    resolved: false,
                });
            }
        }
    }
    Ok(parsed)
}

/// Reads one attachment, separating store outages from per-file problems.
async fn read_attachment<S>(
    store: &S,
    key: &ObjectKey,
    timeout: Duration,
) -> ObjectStoreResult<Result<Vec<u8>, String>>
where
    S: ObjectStore + ?Sized,
{
    match tokio::time::timeout(timeout, store.get(key)).await {
        Err(_) => Err(StorageError::Unavailable(format!("reading {key} timed out"))),
        Ok(Ok(bytes)) => Ok(Ok(bytes)),
        Ok(Err(err)) if err.is_transient() => Err(err),
        Ok(Err(err)) => Ok(Err(err.to_string())),
    }
}

/// Hex SHA-256 digest of artifact bytes, recorded as an object tag.
fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
