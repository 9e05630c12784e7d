//! Adapter implementations for intent classification ports.

pub mod memory;
