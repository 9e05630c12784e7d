//! Rule-first intent classifier with model fallback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::classification::{
    domain::{ClassificationResult, IntentAssessment, IntentInput},
    ports::IntentModel,
    rules,
};
use crate::config::ClassifierConfig;
use crate::request::Request;

const MEMO_CAPACITY: usize = 1_024;

/// Intent classifier service.
///
/// Non-degraded outcomes are memoized by a digest of the input so identical
/// inputs always classify identically, even when the model is
/// nondeterministic.
pub struct IntentClassifier<M>
where
    M: IntentModel,
{
    model: Arc<M>,
    config: ClassifierConfig,
    memo: Mutex<HashMap<String, IntentAssessment>>,
}

impl<M> IntentClassifier<M>
where
    M: IntentModel,
{
    /// Creates a classifier backed by `model` for low-confidence fallback.
    #[must_use]
    pub fn new(model: Arc<M>, config: ClassifierConfig) -> Self {
        Self {
            model,
            config,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Classifies `request`.
    ///
    /// This never fails: a model backend error or timeout degrades the
    /// outcome to a low-confidence chat result flagged as degraded.
    pub async fn classify(&self, request: &Request) -> ClassificationResult {
        let input = IntentInput::from_request(request);
        let needs_current = rules::needs_current_information(input.text());
        let key = memo_key(&input);

        if let Some(cached) = self.recall(&key) {
            debug!(request_id = %request.id(), kind = %cached.kind, "classification memo hit");
            return ClassificationResult::new(request.id(), cached, needs_current);
        }

        let ruled = rules::classify(&input);
        if ruled.confidence.meets(self.config.confidence_threshold) {
            self.remember(key, &ruled);
            return ClassificationResult::new(request.id(), ruled, needs_current);
        }

        let outcome =
            tokio::time::timeout(self.config.model_timeout(), self.model.assess(&input)).await;
        match outcome {
            Ok(Ok(modelled)) => {
                let chosen = if modelled.confidence >= ruled.confidence {
                    modelled
                } else {
                    ruled
                };
                self.remember(key, &chosen);
                ClassificationResult::new(request.id(), chosen, needs_current)
            }
            Ok(Err(err)) => {
                warn!(
                    request_id = %request.id(),
                    error = %err,
                    "intent model failed; degrading to chat"
                );
                ClassificationResult::degraded(
                    request.id(),
                    format!("classifier backend unavailable: {err}"),
                    needs_current,
                )
            }
            Err(_) => {
                warn!(request_id = %request.id(), "intent model timed out; degrading to chat");
                ClassificationResult::degraded(
                    request.id(),
                    "classifier backend timed out",
                    needs_current,
                )
            }
        }
    }

    fn recall(&self, key: &str) -> Option<IntentAssessment> {
        self.memo.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: String, assessment: &IntentAssessment) {
        if let Ok(mut memo) = self.memo.lock() {
            if memo.len() >= MEMO_CAPACITY {
                memo.clear();
            }
            memo.insert(key, assessment.clone());
        }
    }
}

fn memo_key(input: &IntentInput) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.text().as_bytes());
    for content_type in input.content_types() {
        hasher.update([0_u8]);
        hasher.update(content_type.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
