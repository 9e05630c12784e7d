//! Classification services.

mod classifier;

pub use classifier::IntentClassifier;
