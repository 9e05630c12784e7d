//! Mapping from agent kind to its handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::agent::ports::AgentHandler;
use crate::request::AgentKind;

/// Errors returned while building an agent registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A handler for the kind is already registered.
    #[error("a handler for {0} is already registered")]
    Duplicate(AgentKind),
}

/// Read-mostly registry of handlers keyed by the closed [`AgentKind`] set.
///
/// The registry is assembled once at startup and shared by every dispatcher
/// execution.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    handlers: BTreeMap<AgentKind, Arc<dyn AgentHandler>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl AgentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under the kind it declares.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when that kind already has a
    /// handler.
    pub fn register(&mut self, handler: Arc<dyn AgentHandler>) -> Result<(), RegistryError> {
        let kind = handler.kind();
        if self.handlers.contains_key(&kind) {
            return Err(RegistryError::Duplicate(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }

    /// Registers `handler`, returning the registry for chaining.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when that kind already has a
    /// handler.
    pub fn with(mut self, handler: Arc<dyn AgentHandler>) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    /// Drops handlers for kinds outside `supported`.
    #[must_use]
    pub fn restricted_to(mut self, supported: &[AgentKind]) -> Self {
        self.handlers.retain(|kind, _| supported.contains(kind));
        self
    }

    /// Returns the handler for `kind`, if registered.
    #[must_use]
    pub fn get(&self, kind: AgentKind) -> Option<Arc<dyn AgentHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Returns registered kinds in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<AgentKind> {
        self.handlers.keys().copied().collect()
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns whether no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
