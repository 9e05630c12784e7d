//! Agent handlers and the backends they compose.
//!
//! Every handler implements [`ports::AgentHandler`] and is registered in an
//! [`services::AgentRegistry`] keyed by the closed
//! [`crate::request::AgentKind`] enumeration. Handlers reach external
//! services only through the backend and object store ports.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Handler variants in [`handlers`]
//! - Prompt templates in [`prompts`]
//! - Registry in [`services`]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod ports;
pub mod prompts;
pub mod services;

#[cfg(test)]
mod tests;
