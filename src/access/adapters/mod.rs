//! Adapter implementations for the identity verifier port.

pub mod memory;
