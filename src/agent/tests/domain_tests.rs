//! Tests for agent domain types.

use std::time::Duration;

use crate::agent::domain::{
    AgentCapabilities, CandidateResult, Escalation, ObjectKey, ResultPayload, RetrievalScope,
    ToolFailure, ToolName, sanitize_file_name,
};
use crate::request::{RequestId, UserId};
use rstest::rstest;

#[rstest]
#[case("Q2 results.pptx", "Q2_results.pptx")]
#[case("../../etc/passwd", "etcpasswd")]
#[case("report (final)!.pdf", "report_final.pdf")]
#[case("   ", "unnamed")]
#[case("...", "unnamed")]
fn file_names_are_sanitized(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(sanitize_file_name(raw), expected);
}

#[rstest]
fn artifact_keys_follow_layout() {
    let user = UserId::new("ana@example.com").expect("valid user id");
    let request = RequestId::new();
    let key = ObjectKey::artifact("artifacts", &user, request, "Deck one.json");
    assert_eq!(
        key.as_str(),
        format!("artifacts/anaexample.com/{request}/Deck_one.json")
    );
}

#[rstest]
#[case("a/b/deck.json", 2, "a/b/deck_v2.json")]
#[case("a/b/deck.tar.gz", 3, "a/b/deck_v3.tar.gz")]
#[case("a/b/README", 2, "a/b/README_v2")]
#[case("deck.json", 4, "deck_v4.json")]
fn versioned_keys_keep_extension(#[case] key: &str, #[case] n: u32, #[case] expected: &str) {
    let parsed = ObjectKey::parse(key).expect("valid key");
    assert_eq!(parsed.versioned(n).as_str(), expected);
}

#[rstest]
#[case("")]
#[case("/absolute/path")]
#[case("a//b")]
#[case("a/../b")]
#[case("./a")]
fn invalid_object_keys_are_rejected(#[case] raw: &str) {
    assert!(ObjectKey::parse(raw).is_none());
}

#[rstest]
fn retrieval_scope_broadens_to_global() {
    let scope = RetrievalScope::Attachments.broaden();
    assert_eq!(scope, RetrievalScope::Collection);
    assert_eq!(scope.broaden(), RetrievalScope::Global);
    assert_eq!(RetrievalScope::Global.broaden(), RetrievalScope::Global);
}

#[rstest]
fn escalation_broadens_retrieval_and_caps_top_k() {
    let first = Escalation::default();
    let second = first.next_level().with_broader_retrieval();
    assert_eq!(second.level(), 1);
    assert_eq!(second.retrieval_scope(), RetrievalScope::Collection);
    assert_eq!(second.top_k(), first.top_k() * 2);

    let wide = (0..10).fold(second, |current, _| current.with_broader_retrieval());
    assert_eq!(wide.top_k(), 50);
}

#[rstest]
fn escalation_can_disable_web_search() {
    let escalation = Escalation::default().without_web_search();
    assert!(!escalation.web_search_enabled());
}

#[rstest]
fn capabilities_deduplicate_tools() {
    let capabilities = AgentCapabilities::new(
        [ToolName::WebSearch, ToolName::ContentGeneration, ToolName::WebSearch],
        Duration::from_secs(5),
    );
    assert_eq!(capabilities.tools().len(), 2);
    assert!(capabilities.uses(ToolName::WebSearch));
    assert!(!capabilities.uses(ToolName::ObjectStore));
}

#[rstest]
fn candidate_tracks_tools_once_and_failures() {
    let result = CandidateResult::new(ResultPayload::Chat {
        text: "hi".to_owned(),
    })
    .with_tools([ToolName::WebSearch, ToolName::ContentGeneration, ToolName::WebSearch])
    .with_failure(ToolFailure {
        tool: ToolName::WebSearch,
        message: "timeout".to_owned(),
        resolved: false,
    });

    assert_eq!(
        result.tools_used(),
        &[ToolName::WebSearch, ToolName::ContentGeneration]
    );
    assert!(result.is_degraded());
    assert!(result.has_unresolved_failures());
}

#[rstest]
#[case(ToolName::ContentGeneration, "content_generation")]
#[case(ToolName::KnowledgeBaseSearch, "knowledge_base_search")]
#[case(ToolName::ObjectStore, "object_store")]
fn tool_names_render_for_callers(#[case] tool: ToolName, #[case] expected: &str) {
    assert_eq!(tool.as_str(), expected);
}
