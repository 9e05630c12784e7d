//! Step definitions for request dispatch behaviour tests.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
