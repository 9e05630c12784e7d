//! Domain types for intent classification.

mod confidence;
mod result;

pub use confidence::Confidence;
pub use result::{ClassificationResult, IntentAssessment, IntentInput};
