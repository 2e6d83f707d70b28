use std::sync::Arc;

use docqa::DEGRADATION_MESSAGE;
use docqa::config::{Config, ProviderKind};
use docqa::llm::{
    AnswerSource, CredentialRotator, CredentialSet, InvocationRequest, build_router_from,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rotator(label: &str, keys: &[&str]) -> Arc<CredentialRotator> {
    let set = CredentialSet::new(label, "TEST_KEY", keys.iter().map(ToString::to_string).collect())
        .unwrap();
    Arc::new(CredentialRotator::new(label, set))
}

fn config(gemini: &MockServer, compat: &MockServer) -> Config {
    let mut config = Config::default();
    config.gemini.base_url = gemini.uri();
    config.gemini.model = "gemini-2.0-flash".into();
    config.openai_compatible.base_url = format!("{}/v1", compat.uri());
    config
}

fn gemini_answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    }))
}

fn compat_answer(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    }))
}

fn request() -> InvocationRequest {
    InvocationRequest::new(
        "The capital of France is Paris.",
        "What is the capital of France?",
    )
}

#[tokio::test]
async fn gemini_success_never_touches_fallback() {
    let gemini = MockServer::start().await;
    let compat = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.0-flash:generateContent"))
        .respond_with(gemini_answer("Paris"))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .respond_with(compat_answer("unused"))
        .expect(0)
        .mount(&compat)
        .await;

    let config = config(&gemini, &compat);
    let router = build_router_from(&config, |kind| Ok(rotator(kind.as_str(), &["k1", "k2"]))).unwrap();

    let answer = router.route(&request()).await;
    assert_eq!(answer.text, "Paris");
    assert_eq!(answer.source, AnswerSource::Primary);
}

#[tokio::test]
async fn gemini_quota_exhaustion_switches_to_fallback() {
    let gemini = MockServer::start().await;
    let compat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        })))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk-fallback"))
        .respond_with(compat_answer("Paris, via fallback"))
        .expect(1)
        .mount(&compat)
        .await;

    let config = config(&gemini, &compat);
    let router = build_router_from(&config, |kind| match kind {
        ProviderKind::Gemini => Ok(rotator("gemini", &["AIza-1", "AIza-2"])),
        ProviderKind::OpenAiCompatible => Ok(rotator("groq", &["gsk-fallback"])),
    })
    .unwrap();

    let answer = router.route(&request()).await;
    assert_eq!(answer.text, "Paris, via fallback");
    assert_eq!(answer.source, AnswerSource::Fallback);
}

#[tokio::test]
async fn both_backends_down_yields_degradation_message() {
    let gemini = MockServer::start().await;
    let compat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit"))
        .mount(&compat)
        .await;

    let config = config(&gemini, &compat);
    let router = build_router_from(&config, |kind| Ok(rotator(kind.as_str(), &["k"]))).unwrap();

    let text = router.answer("ctx", "q").await;
    assert_eq!(text, DEGRADATION_MESSAGE);
    assert!(text.contains("technical difficulties with both primary and fallback language models"));
}

#[tokio::test]
async fn degradation_message_never_leaks_credentials() {
    let gemini = MockServer::start().await;
    let compat = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key AIzaSecretValue"))
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid key gsk_secretvalue"))
        .mount(&compat)
        .await;

    let config = config(&gemini, &compat);
    let router = build_router_from(&config, |kind| match kind {
        ProviderKind::Gemini => Ok(rotator("gemini", &["AIzaSecretValue"])),
        ProviderKind::OpenAiCompatible => Ok(rotator("groq", &["gsk_secretvalue"])),
    })
    .unwrap();

    let text = router.answer("ctx", "q").await;
    assert!(!text.contains("AIzaSecretValue"));
    assert!(!text.contains("gsk_secretvalue"));
}
