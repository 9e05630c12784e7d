//! Deployment configuration for the orchestrator.
//!
//! Configuration is deserialized from TOML once at startup, validated, and
//! then shared read-only (typically as `Arc<OrchestratorConfig>`). Nothing
//! in the serving path reads ambient settings mid-request.

mod error;
mod schema;
mod settings;

pub use error::ConfigError;
pub use schema::{FieldSpec, FinancialSchema};
pub use settings::{
    AuditConfig, ClassifierConfig, OrchestratorConfig, PatternConfig, TimeoutConfig,
    ValidatorConfig,
};

#[cfg(test)]
mod tests;
