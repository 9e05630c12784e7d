//! Adapter implementations for the audit store port.

pub mod memory;
pub mod postgres;
