//! Scripted intent model for tests and offline deployments.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::classification::{
    domain::{IntentAssessment, IntentInput},
    ports::{IntentModel, IntentModelError, IntentModelResult},
};

#[derive(Debug, Clone)]
enum Script {
    Answer(IntentAssessment),
    Unavailable(String),
}

/// Intent model that always returns the same scripted outcome.
#[derive(Debug, Clone)]
pub struct ScriptedIntentModel {
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedIntentModel {
    /// Creates a model that always answers with `assessment`.
    #[must_use]
    pub fn answering(assessment: IntentAssessment) -> Self {
        Self {
            script: Script::Answer(assessment),
            calls: Arc::default(),
        }
    }

    /// Creates a model that always reports itself unavailable.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            script: Script::Unavailable(reason.into()),
            calls: Arc::default(),
        }
    }

    /// Returns how many times the model has been consulted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentModel for ScriptedIntentModel {
    async fn assess(&self, _input: &IntentInput) -> IntentModelResult<IntentAssessment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Answer(assessment) => Ok(assessment.clone()),
            Script::Unavailable(reason) => Err(IntentModelError::Unavailable(reason.clone())),
        }
    }
}
