use std::sync::{Arc, Mutex};

use docqa::DEGRADATION_MESSAGE;
use docqa::query::{AnswerOrigin, ChatMessage, RETRIEVAL_FAILED_MESSAGE, chat_response};
use docqa::retrieval::DocumentId;

use crate::harness::{ATLAS, ScriptedProvider, Workspace, router, service};

async fn atlas_workspace() -> (Workspace, docqa::config::Config) {
    let ws = Workspace::with_document("atlas.txt", ATLAS).await;
    let mut config = ws.config();
    config.retrieval.chunk_size = 80;
    config.retrieval.chunk_overlap = 0;
    (ws, config)
}

#[tokio::test]
async fn paris_scenario_answers_from_primary_with_ranked_context() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("Paris")], &log);
    let fallback = ScriptedProvider::new("fallback", vec![Ok("unused")], &log);
    let svc = service(config, router(&primary, Some(&fallback)));

    let report = svc.ingest(&ws.document).await.unwrap();
    assert_eq!(report.document.as_str(), "atlas");
    assert_eq!(report.chunks, 3);

    let answer = svc
        .ask(&report.document, "What is the capital of France?")
        .await;
    assert_eq!(answer.text, "Paris");
    assert_eq!(answer.origin, AnswerOrigin::Primary);
    assert_eq!(fallback.calls(), 0);

    let prompt = primary.prompt(0);
    let france = prompt.find("Paris is the capital of France").unwrap();
    let germany = prompt.find("Berlin is the capital of Germany").unwrap();
    assert!(france < germany, "most relevant chunk should lead the context");
    assert!(prompt.contains("What is the capital of France?"));
}

#[tokio::test]
async fn identical_question_is_generated_once() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("Paris"), Ok("different")], &log);
    let svc = service(config, router(&primary, None));
    let doc = svc.ingest(&ws.document).await.unwrap().document;

    let first = svc.ask(&doc, "What is the capital of France?").await;
    let second = svc.ask(&doc, "What is the capital of France?").await;

    assert_eq!(primary.calls(), 1);
    assert_eq!(first.text, second.text);
    assert_eq!(second.origin, AnswerOrigin::Cache);
}

#[tokio::test]
async fn reingesting_invalidates_cached_answers() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("Paris"), Ok("Paris, still")], &log);
    let svc = service(config, router(&primary, None));
    let doc = svc.ingest(&ws.document).await.unwrap().document;

    svc.ask(&doc, "capital of France?").await;
    svc.ingest(&ws.document).await.unwrap();
    let answer = svc.ask(&doc, "capital of France?").await;

    assert_eq!(primary.calls(), 2);
    assert_eq!(answer.text, "Paris, still");
}

#[tokio::test]
async fn primary_failure_falls_back_in_order() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Err("429 RESOURCE_EXHAUSTED")], &log);
    let fallback = ScriptedProvider::new("fallback", vec![Ok("Paris (fallback)")], &log);
    let svc = service(config, router(&primary, Some(&fallback)));
    let doc = svc.ingest(&ws.document).await.unwrap().document;

    let answer = svc.ask(&doc, "capital of France?").await;
    assert_eq!(answer.text, "Paris (fallback)");
    assert_eq!(answer.origin, AnswerOrigin::Fallback);
    assert_eq!(*log.lock().unwrap(), vec!["primary", "fallback"]);
}

#[tokio::test]
async fn both_providers_failing_degrades_without_caching() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Err("boom")], &log);
    let fallback = ScriptedProvider::new("fallback", vec![Err("quota exceeded")], &log);
    let svc = service(config, router(&primary, Some(&fallback)));
    let doc = svc.ingest(&ws.document).await.unwrap().document;

    for _ in 0..2 {
        let answer = svc.ask(&doc, "capital of France?").await;
        assert_eq!(answer.text, DEGRADATION_MESSAGE);
        assert!(!answer.text.is_empty());
    }
    assert_eq!(primary.calls(), 2);
    assert_eq!(fallback.calls(), 2);
}

#[tokio::test]
async fn unknown_document_never_reaches_providers() {
    let (_ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("unused")], &log);
    let svc = service(config, router(&primary, None));

    let answer = svc
        .ask(&DocumentId::new("never-ingested").unwrap(), "anything")
        .await;
    assert_eq!(answer.text, RETRIEVAL_FAILED_MESSAGE);
    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn chat_turn_round_trips_history() {
    let (ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("Paris")], &log);
    let svc = service(config, router(&primary, None));
    let doc = svc.ingest(&ws.document).await.unwrap().document;

    let (input, history) = chat_response(
        svc.handler(),
        "What is the capital of France?",
        Vec::new(),
        Some(&doc),
    )
    .await;

    assert!(input.is_empty());
    assert_eq!(
        history,
        vec![
            ChatMessage::user("What is the capital of France?"),
            ChatMessage::assistant("Paris"),
        ]
    );
}

#[tokio::test]
async fn default_document_is_indexed_once_before_serving() {
    let (_ws, config) = atlas_workspace().await;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("Paris")], &log);
    let svc = service(config.clone(), router(&primary, None));

    let report = svc.ensure_default_ingested().await.unwrap().unwrap();
    assert_eq!(report.document.as_str(), "atlas");
    assert_eq!(report.chunks, 3);
    assert!(svc.ensure_default_ingested().await.unwrap().is_none());

    let answer = svc
        .ask(&report.document, "What is the capital of France?")
        .await;
    assert_eq!(answer.origin, AnswerOrigin::Primary);

    let restarted = service(config, router(&primary, None));
    assert!(restarted.ensure_default_ingested().await.unwrap().is_none());
}

#[tokio::test]
async fn no_default_document_means_nothing_to_ingest() {
    let (_ws, mut config) = atlas_workspace().await;
    config.document_path = None;
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = ScriptedProvider::new("primary", vec![Ok("unused")], &log);
    let svc = service(config, router(&primary, None));

    assert!(svc.ensure_default_ingested().await.unwrap().is_none());
}
