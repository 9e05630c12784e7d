//! Unit tests for request domain types.
