//! Unit tests for the dispatch module.

mod dispatcher_tests;

use std::sync::Arc;
use std::time::Duration;

use crate::agent::{
    adapters::memory::{
        InMemoryObjectStore, ScriptedFieldExtractor, ScriptedGenerativeModel, ScriptedRetriever,
        ScriptedWebSearch,
    },
    handlers::{ChatHandler, DocumentHandler, FinancialHandler, PresentationHandler},
    ports::AgentHandler,
    services::AgentRegistry,
};
use crate::audit::{adapters::memory::InMemoryAuditStore, services::AuditRecorder};
use crate::classification::{
    adapters::memory::ScriptedIntentModel,
    domain::{Confidence, IntentAssessment},
    services::IntentClassifier,
};
use crate::config::{FinancialSchema, OrchestratorConfig};
use crate::dispatch::services::Dispatcher;
use crate::request::{CallerIdentity, Request, RequestKind, Role, UserId};
use crate::validation::service::OutputValidator;
use mockable::DefaultClock;

pub(super) type TestDispatcher =
    Dispatcher<ScriptedIntentModel, InMemoryObjectStore, InMemoryAuditStore, DefaultClock>;

/// Backends shared by the handlers under test.
pub(super) struct Backends {
    pub(super) model: Arc<ScriptedGenerativeModel>,
    pub(super) retriever: Arc<ScriptedRetriever>,
    pub(super) extractor: Arc<ScriptedFieldExtractor>,
    pub(super) search: Arc<ScriptedWebSearch>,
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

/// Dispatcher plus the stores it writes to.
pub(super) struct Harness {
    pub(super) dispatcher: TestDispatcher,
    pub(super) objects: Arc<InMemoryObjectStore>,
    pub(super) audit: Arc<InMemoryAuditStore>,
}

pub(super) fn handlers(
    backends: &Backends,
    objects: &Arc<InMemoryObjectStore>,
) -> Vec<Arc<dyn AgentHandler>> {
    vec![
        Arc::new(PresentationHandler::new(
            Arc::clone(&backends.model),
            Arc::clone(objects),
        )),
        Arc::new(DocumentHandler::new(
            Arc::clone(&backends.retriever),
            Arc::clone(&backends.model),
            Arc::clone(objects),
        )),
        Arc::new(FinancialHandler::new(
            Arc::clone(&backends.extractor),
            Arc::clone(objects),
            FinancialSchema::default(),
        )),
        Arc::new(ChatHandler::new(
            Arc::clone(&backends.model),
            Arc::clone(&backends.search),
            0.5,
        )),
    ]
}

pub(super) fn harness_with(
    config: OrchestratorConfig,
    handlers: Vec<Arc<dyn AgentHandler>>,
    objects: Arc<InMemoryObjectStore>,
) -> Harness {
    let audit = Arc::new(InMemoryAuditStore::new());
    let registry = handlers
        .into_iter()
        .try_fold(AgentRegistry::new(), AgentRegistry::with)
        .expect("distinct handler kinds");
    let intent_model = ScriptedIntentModel::answering(IntentAssessment::new(
        RequestKind::Chat,
        Confidence::saturating(0.8),
        "conversational",
    ));
    let classifier = IntentClassifier::new(Arc::new(intent_model), config.classifier().clone());
    let validator = OutputValidator::new(Arc::clone(&objects), config.validator().clone());
    let recorder = AuditRecorder::new(
        Arc::clone(&audit),
        Arc::new(DefaultClock),
        Duration::from_millis(200),
        config.audit().retention(),
    );
    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        Arc::new(classifier),
        Arc::new(validator),
        Arc::new(recorder),
        Arc::new(DefaultClock),
        Arc::new(config),
    );
    Harness {
        dispatcher,
        objects,
        audit,
    }
}

pub(super) fn harness(backends: &Backends) -> Harness {
    let objects = Arc::new(InMemoryObjectStore::new());
    let registered = handlers(backends, &objects);
    harness_with(OrchestratorConfig::default(), registered, objects)
}

pub(super) fn caller(role: Role) -> CallerIdentity {
    CallerIdentity::new(UserId::new("ana").expect("valid user id"), role)
}

pub(super) fn request(role: Role, text: &str) -> Request {
    Request::new(caller(role), text, &DefaultClock).expect("valid request")
}
