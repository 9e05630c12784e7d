//! Per-kind correctness checks for candidate results.
//!
//! Checks are pure functions in [`rules`]; [`service::OutputValidator`]
//! selects the rules for a result's kind, resolves artifact references
//! through the object store, and folds the outcome into a [`Verdict`].

pub mod rules;
pub mod service;
mod verdict;

pub use verdict::{Rejection, Verdict};

#[cfg(test)]
mod tests;
