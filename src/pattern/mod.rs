//! Advisory aggregate insights derived from the audit trail.
//!
//! The [`services::PatternAnalyzer`] reads a window of audit entries, folds
//! them into per-request outcomes, and writes one [`domain::Pattern`] per
//! metric and agent kind. Later runs supersede earlier patterns instead of
//! mutating them. Nothing on the serving path reads patterns.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
