//! Intent classification for inbound requests.
//!
//! Classification runs deterministic keyword rules first and consults a
//! model-based fallback only when the rule confidence is below the
//! configured threshold. Backend failure never blocks the pipeline: the
//! classifier degrades to [`crate::request::RequestKind::Chat`] with low
//! confidence and flags the result as degraded.
//!
//! - Domain types in [`domain`]
//! - Keyword rules in [`rules`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Classification service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod rules;
pub mod services;

#[cfg(test)]
mod tests;
