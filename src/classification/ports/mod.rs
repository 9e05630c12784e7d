//! Port contracts for intent classification.

pub mod model;

#[cfg(test)]
pub use model::MockIntentModel;
pub use model::{IntentModel, IntentModelError, IntentModelResult};
