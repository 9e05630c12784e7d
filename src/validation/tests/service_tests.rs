//! Tests for the output validator service.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::{fixture, rstest};

use crate::agent::{
    adapters::memory::InMemoryObjectStore,
    domain::{CandidateResult, ObjectKey, ResultPayload, SlideManifest, TemplateClass},
    ports::{ObjectStore, PutObject},
};
use crate::config::ValidatorConfig;
use crate::request::{AgentKind, CallerIdentity, Request, RequestMode, Role, UserId};
use crate::validation::service::OutputValidator;

#[fixture]
fn request() -> Request {
    let caller = CallerIdentity::new(UserId::new("ana").expect("valid user id"), Role::Admin);
    Request::new(caller, "anything", &DefaultClock).expect("valid request")
}

fn deck(artifact: ObjectKey, slide_count: u32) -> CandidateResult {
    CandidateResult::new(ResultPayload::Presentation {
        artifact,
        manifest: SlideManifest {
            slide_count,
            section_titles: Vec::new(),
        },
        template: TemplateClass::Standard,
    })
}

async fn stored_artifact(store: &InMemoryObjectStore) -> ObjectKey {
    store
        .put(PutObject::new(
            ObjectKey::parse("artifacts/ana/r/deck.json").expect("valid key"),
            b"{}".to_vec(),
            "application/json",
        ))
        .await
        .expect("store artifact")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resolvable_deck_within_limits_is_accepted(request: Request) {
    let store = Arc::new(InMemoryObjectStore::new());
    let artifact = stored_artifact(&store).await;
    let validator = OutputValidator::new(store, ValidatorConfig::default());

    let verdict = validator
        .validate(&request, AgentKind::Presentation, &deck(artifact, 10))
        .await;

    assert!(verdict.is_accepted());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unresolvable_artifact_is_retryable(request: Request) {
    let validator = OutputValidator::new(
        Arc::new(InMemoryObjectStore::new()),
        ValidatorConfig::default(),
    );
    let missing = ObjectKey::parse("artifacts/ana/r/gone.json").expect("valid key");

    let verdict = validator
        .validate(&request, AgentKind::Presentation, &deck(missing, 10))
        .await;

    assert!(!verdict.is_accepted());
    assert!(verdict.is_retryable());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_artifact_lookup_is_a_retryable_rejection(request: Request) {
    let store = Arc::new(InMemoryObjectStore::new());
    let artifact = stored_artifact(&store).await;
    store.set_read_delay(Duration::from_secs(3_600));
    let config = ValidatorConfig {
        lookup_timeout_ms: 50,
        ..ValidatorConfig::default()
    };
    let validator = OutputValidator::new(store, config);

    let verdict = tokio::time::timeout(
        Duration::from_secs(5),
        validator.validate(&request, AgentKind::Presentation, &deck(artifact, 10)),
    )
    .await
    .expect("lookup is bounded");

    assert!(!verdict.is_accepted());
    assert!(verdict.is_retryable());
    assert_eq!(verdict.public_reasons(), &["artifact is not resolvable".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slide_limit_comes_from_config(request: Request) {
    let store = Arc::new(InMemoryObjectStore::new());
    let artifact = stored_artifact(&store).await;
    let config = ValidatorConfig {
        max_slides: 8,
        ..ValidatorConfig::default()
    };
    let validator = OutputValidator::new(store, config);

    let verdict = validator
        .validate(&request, AgentKind::Presentation, &deck(artifact, 10))
        .await;

    assert_eq!(verdict.reasons(), &["deck has 10 slides, limit is 8".to_owned()]);
}

#[rstest]
#[case(RequestMode::Grounded, false)]
#[case(RequestMode::Freeform, true)]
#[tokio::test(flavor = "multi_thread")]
async fn uncited_answers_depend_on_mode(
    request: Request,
    #[case] mode: RequestMode,
    #[case] accepted: bool,
) {
    let validator = OutputValidator::new(
        Arc::new(InMemoryObjectStore::new()),
        ValidatorConfig::default(),
    );
    let answer = CandidateResult::new(ResultPayload::Document {
        answer: "It depends.".to_owned(),
        citations: Vec::new(),
    });

    let verdict = validator
        .validate(&request.with_mode(mode), AgentKind::Document, &answer)
        .await;

    assert_eq!(verdict.is_accepted(), accepted);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_financial_field_is_terminal(request: Request) {
    let validator = OutputValidator::new(
        Arc::new(InMemoryObjectStore::new()),
        ValidatorConfig::default(),
    );
    let extraction = CandidateResult::new(ResultPayload::Financial {
        schema: "loan_portfolio".to_owned(),
        fields: BTreeMap::from([("net_interest_margin".to_owned(), 3.1)]),
    });

    let verdict = validator
        .validate(&request, AgentKind::Financial, &extraction)
        .await;

    assert!(!verdict.is_accepted());
    assert!(!verdict.is_retryable());
    assert_eq!(
        verdict.reasons(),
        &["missing required field: total_loans".to_owned()]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mismatched_payload_is_terminal(request: Request) {
    let validator = OutputValidator::new(
        Arc::new(InMemoryObjectStore::new()),
        ValidatorConfig::default(),
    );
    let chat = CandidateResult::new(ResultPayload::Chat {
        text: "hello".to_owned(),
    });

    let verdict = validator
        .validate(&request, AgentKind::Document, &chat)
        .await;

    assert!(!verdict.is_retryable());
}
