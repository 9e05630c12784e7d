//! Dispatch orchestration services.

mod dispatcher;
mod execution;

pub use dispatcher::Dispatcher;
