//! In-memory intent model doubles.

mod model;

pub use model::ScriptedIntentModel;
