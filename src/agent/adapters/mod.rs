//! Adapter implementations for agent ports.

pub mod fs;
pub mod memory;
