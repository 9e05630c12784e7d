//! Unit tests for the classification module.
