//! Unit tests for the agent module.

mod domain_tests;
