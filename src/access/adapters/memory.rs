//! In-memory token verifier.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::access::ports::{AuthError, AuthResult, IdentityVerifier};
use crate::request::CallerIdentity;

/// Token verifier backed by an in-process table.
///
/// Only SHA-256 digests of issued tokens are held, so lookups never compare
/// raw secrets.
#[derive(Debug, Clone)]
pub struct InMemoryIdentityVerifier {
    tokens: Arc<RwLock<HashMap<String, CallerIdentity>>>,
    available: Arc<AtomicBool>,
}

impl Default for InMemoryIdentityVerifier {
    fn default() -> Self {
        Self {
            tokens: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryIdentityVerifier {
    /// Creates a verifier with no issued tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues `token` to `identity`, replacing any earlier holder.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for a blank token and
    /// [`AuthError::Provider`] when the table lock is poisoned.
    pub fn issue(&self, token: &str, identity: CallerIdentity) -> AuthResult<()> {
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let mut tokens = self.tokens.write().map_err(lock_error)?;
        tokens.insert(digest(token), identity);
        Ok(())
    }

    /// Revokes `token`. Returns whether it had been issued.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Provider`] when the table lock is poisoned.
    pub fn revoke(&self, token: &str) -> AuthResult<bool> {
        let mut tokens = self.tokens.write().map_err(lock_error)?;
        Ok(tokens.remove(&digest(token)).is_some())
    }

    /// Makes every verification fail with [`AuthError::Unavailable`] until
    /// re-enabled.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn lock_error(err: impl std::fmt::Display) -> AuthError {
    AuthError::provider(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl IdentityVerifier for InMemoryIdentityVerifier {
    async fn verify(&self, token: &str) -> AuthResult<CallerIdentity> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("identity table offline".to_owned()));
        }
        if token.trim().is_empty() {
            return Err(AuthError::InvalidToken);
        }
        let tokens = self.tokens.read().map_err(lock_error)?;
        tokens
            .get(&digest(token))
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
