//! Request orchestration: classify, select, invoke, validate, retry.
//!
//! One [`services::Dispatcher`] execution owns a request end to end. It
//! walks the [`domain::PipelineState`] machine, records exactly one audit
//! entry per transition, and bounds retries by the configured
//! `max_attempts`.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
