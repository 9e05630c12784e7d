//! Unit tests for the validation module.

mod service_tests;
