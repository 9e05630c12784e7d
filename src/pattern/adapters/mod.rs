//! Adapter implementations for the pattern store port.

pub mod memory;
pub mod postgres;
