//! Shared pipeline wiring for in-memory integration tests.

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
    ports::{AgentHandler, Passage},
    services::AgentRegistry,
};
use scriptorium::audit::{
    adapters::memory::InMemoryAuditStore, domain::AuditEntry, ports::AuditStore,
    services::AuditRecorder,
};
use scriptorium::classification::{
    adapters::memory::ScriptedIntentModel,
    domain::{Confidence, IntentAssessment},
    services::IntentClassifier,
};
use scriptorium::config::OrchestratorConfig;
use scriptorium::dispatch::{domain::DispatchOutcome, services::Dispatcher};
use scriptorium::request::{CallerIdentity, Request, RequestId, RequestKind, Role, UserId};
use scriptorium::validation::service::OutputValidator;
use tokio_util::sync::CancellationToken;

/// Dispatcher type wired to in-memory adapters.
pub type TestDispatcher =
    Dispatcher<ScriptedIntentModel, InMemoryObjectStore, InMemoryAuditStore, DefaultClock>;

/// Scripted backends behind the four handlers.
pub struct Backends {
    pub model: Arc<ScriptedGenerativeModel>,
    pub retriever: Arc<ScriptedRetriever>,
    pub extractor: Arc<ScriptedFieldExtractor>,
    pub search: Arc<ScriptedWebSearch>,
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            model: Arc::new(ScriptedGenerativeModel::new().with_slides("Q2 results", 10)),
            retriever: Arc::new(ScriptedRetriever::empty()),
            extractor: Arc::new(ScriptedFieldExtractor::returning([
                ("total_loans", 1_250_000.0),
                ("net_interest_margin", 3.4),
            ])),
            search: Arc::new(ScriptedWebSearch::returning(Vec::new())),
        }
    }
}

impl Backends {
    /// Backends whose knowledge base finds `sources` at every scope.
    #[must_use]
    pub fn citing(sources: &[&str]) -> Self {
        let passages = sources
            .iter()
            .map(|source_id| Passage {
                source_id: (*source_id).to_owned(),
                text: format!("excerpt from {source_id}"),
                score: 0.9,
            })
            .collect();
        Self {
            retriever: Arc::new(ScriptedRetriever::returning(passages)),
            ..Self::default()
        }
    }
}

/// A dispatcher and the stores it writes to.
pub struct Pipeline {
    pub dispatcher: TestDispatcher,
    pub objects: Arc<InMemoryObjectStore>,
    pub audit: Arc<InMemoryAuditStore>,
}

impl Pipeline {
    /// Builds a pipeline with default configuration and a fresh audit store.
    #[must_use]
    pub fn new(backends: &Backends) -> Self {
        Self::sharing(backends, Arc::new(InMemoryAuditStore::new()))
    }

    /// Builds a pipeline writing to an existing audit store.
    #[must_use]
    pub fn sharing(backends: &Backends, audit: Arc<InMemoryAuditStore>) -> Self {
        let config = OrchestratorConfig::default();
        let objects = Arc::new(InMemoryObjectStore::new());
        let handlers: Vec<Arc<dyn AgentHandler>> = vec![
            Arc::new(PresentationHandler::new(
                Arc::clone(&backends.model),
                Arc::clone(&objects),
            )),
            Arc::new(DocumentHandler::new(
                Arc::clone(&backends.retriever),
                Arc::clone(&backends.model),
                Arc::clone(&objects),
            )),
            Arc::new(FinancialHandler::new(
                Arc::clone(&backends.extractor),
                Arc::clone(&objects),
                config.validator().financial_schema.clone(),
            )),
            Arc::new(ChatHandler::new(
                Arc::clone(&backends.model),
                Arc::clone(&backends.search),
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
        let recorder = AuditRecorder::new(
            Arc::clone(&audit),
            Arc::new(DefaultClock),
            Duration::from_millis(200),
            config.audit().retention(),
        );
        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            Arc::new(IntentClassifier::new(
                Arc::new(intent_model),
                config.classifier().clone(),
            )),
            Arc::new(OutputValidator::new(
                Arc::clone(&objects),
                config.validator().clone(),
            )),
            Arc::new(recorder),
            Arc::new(DefaultClock),
            Arc::new(config),
        );
        Self {
            dispatcher,
            objects,
            audit,
        }
    }

    /// Dispatches `instructions` for a caller holding `role`.
    pub async fn dispatch(&self, role: Role, instructions: &str) -> DispatchOutcome {
        let request =
            Request::new(caller("ana", role), instructions, &DefaultClock).expect("valid request");
        self.dispatcher
            .handle(request, CancellationToken::new())
            .await
    }

    /// Returns the audit trail of one request in pipeline order.
    pub async fn trail(&self, request_id: RequestId) -> Vec<AuditEntry> {
        self.audit
            .find_by_request(request_id)
            .await
            .expect("audit store readable")
    }
}

/// Builds a caller identity.
#[must_use]
pub fn caller(user: &str, role: Role) -> CallerIdentity {
    CallerIdentity::new(UserId::new(user).expect("valid user id"), role)
}

/// Provides default scripted backends.
#[fixture]
pub fn backends() -> Backends {
    Backends::default()
}
