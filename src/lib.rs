//! Scriptorium: request orchestration for generative work agents.
//!
//! A verified caller submits free-text instructions and optional file keys.
//! The orchestrator classifies the request, dispatches it to one of four
//! agent handlers, validates the candidate result, retries within a bounded
//! budget, and records every pipeline transition in an append-only audit
//! trail. A decoupled analyzer mines that trail for advisory patterns.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, filesystem,
//!   `PostgreSQL`)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`config`]: Immutable deployment configuration
//! - [`request`]: Requests, caller identity, and kinds
//! - [`classification`]: Intent classification
//! - [`agent`]: Agent handlers, backends, and the object store
//! - [`validation`]: Per-kind candidate checks
//! - [`dispatch`]: Pipeline state machine and dispatcher
//! - [`audit`]: Append-only audit trail
//! - [`pattern`]: Pattern analysis over the audit trail
//! - [`access`]: Caller verification and the admin query surface

pub mod access;
pub mod agent;
pub mod audit;
pub mod classification;
pub mod config;
pub mod dispatch;
pub mod pattern;
pub mod request;
pub mod validation;
