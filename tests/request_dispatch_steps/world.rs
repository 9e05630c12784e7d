//! Shared world state for request dispatch BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use scriptorium::agent::{
    adapters::memory::{
        InMemoryObjectStore, ScriptedFieldExtractor, ScriptedGenerativeModel, ScriptedRetriever,
        ScriptedWebSearch,
    },
    handlers::{ChatHandler, DocumentHandler, FinancialHandler, PresentationHandler},
    ports::AgentHandler,
    services::AgentRegistry,
};
use scriptorium::audit::{adapters::memory::InMemoryAuditStore, services::AuditRecorder};
use scriptorium::classification::{
    adapters::memory::ScriptedIntentModel,
    domain::{Confidence, IntentAssessment},
    services::IntentClassifier,
};
use scriptorium::config::OrchestratorConfig;
use scriptorium::dispatch::{domain::DispatchOutcome, services::Dispatcher};
use scriptorium::request::{CallerIdentity, RequestKind};
use scriptorium::validation::service::OutputValidator;

/// Dispatcher type used by the BDD world.
pub type TestDispatcher =
    Dispatcher<ScriptedIntentModel, InMemoryObjectStore, InMemoryAuditStore, DefaultClock>;

/// Scenario world for request dispatch behaviour tests.
pub struct DispatchWorld {
    /// Dispatcher under test.
    pub dispatcher: TestDispatcher,
    /// Audit store the dispatcher writes to.
    pub audit: Arc<InMemoryAuditStore>,
    /// Caller set by the given steps.
    pub caller: Option<CallerIdentity>,
    /// Outcome of the most recent submission.
    pub outcome: Option<DispatchOutcome>,
}

impl DispatchWorld {
    /// Creates a world wired to scripted backends and in-memory stores.
    #[must_use]
    pub fn new() -> Self {
        let config = OrchestratorConfig::default();
        let audit = Arc::new(InMemoryAuditStore::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let model = Arc::new(ScriptedGenerativeModel::new().with_slides("Q2 results", 10));
        let handlers: Vec<Arc<dyn AgentHandler>> = vec![
            Arc::new(PresentationHandler::new(
                Arc::clone(&model),
                Arc::clone(&objects),
            )),
            Arc::new(DocumentHandler::new(
                Arc::new(ScriptedRetriever::empty()),
                Arc::clone(&model),
                Arc::clone(&objects),
            )),
            Arc::new(FinancialHandler::new(
                Arc::new(ScriptedFieldExtractor::returning([(
                    "total_loans",
                    1_000.0,
                )])),
                Arc::clone(&objects),
                config.validator().financial_schema.clone(),
            )),
            Arc::new(ChatHandler::new(
                Arc::clone(&model),
                Arc::new(ScriptedWebSearch::returning(Vec::new())),
                config.classifier().web_search_threshold,
            )),
        ];
        let registry = handlers
            .into_iter()
            .try_fold(AgentRegistry::new(), AgentRegistry::with)
            .expect("one handler per kind");
        let intent_model = ScriptedIntentModel::answering(IntentAssessment::new(
            RequestKind::Chat,
            Confidence::saturating(0.8),
            "conversational",
        ));
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(IntentClassifier::new(
                Arc::new(intent_model),
                config.classifier().clone(),
            )),
            Arc::new(OutputValidator::new(objects, config.validator().clone())),
            Arc::new(AuditRecorder::new(
                Arc::clone(&audit),
                Arc::new(DefaultClock),
                Duration::from_millis(200),
                config.audit().retention(),
            )),
            Arc::new(DefaultClock),
            Arc::new(config),
        );

        Self {
            dispatcher,
            audit,
            caller: None,
            outcome: None,
        }
    }
}

impl Default for DispatchWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> DispatchWorld {
    DispatchWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
