use std::collections::HashMap;
use std::sync::Arc;

use docqa::config::collect_credential_slots;
use docqa::llm::{CredentialRotator, CredentialSet, GeminiProvider, GenerationParams, Provider};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

fn env_like(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

#[test]
fn numbered_slots_feed_the_rotator() {
    let keys = collect_credential_slots(
        "GEMINI_API_KEY",
        8,
        env_like(&[
            ("GEMINI_API_KEY_1", "alpha"),
            ("GEMINI_API_KEY_2", "beta"),
            ("GEMINI_API_KEY_3", "gamma"),
        ]),
    );
    let set = CredentialSet::new("gemini", "GEMINI_API_KEY", keys).unwrap();
    let rotator = CredentialRotator::new("gemini", set);
    assert_eq!(rotator.len(), 3);

    let mut previous = rotator.next_credential().to_string();
    for _ in 0..1000 {
        let current = rotator.next_credential().to_string();
        assert_ne!(current, previous);
        previous = current;
    }
}

#[test]
fn single_slot_always_returns_the_same_key() {
    let keys = collect_credential_slots("K", 4, env_like(&[("K", "solo")]));
    let rotator = CredentialRotator::new("k", CredentialSet::new("k", "K", keys).unwrap());
    assert!((0..50).all(|_| rotator.next_credential() == "solo"));
}

#[tokio::test]
async fn outbound_requests_never_reuse_the_previous_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
        })))
        .mount(&server)
        .await;

    let set = CredentialSet::new(
        "gemini",
        "GEMINI_API_KEY",
        vec!["key-a".into(), "key-b".into(), "key-c".into()],
    )
    .unwrap();
    let provider = GeminiProvider::new(&server.uri(), Arc::new(CredentialRotator::new("gemini", set)));

    for _ in 0..30 {
        provider
            .generate("q", "gemini-2.0-flash", &GenerationParams::default())
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    let keys: Vec<String> = requests
        .iter()
        .map(|r| {
            r.headers
                .get("x-goog-api-key")
                .unwrap()
                .to_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(keys.len(), 30);
    assert!(keys.windows(2).all(|pair| pair[0] != pair[1]));
    assert!(requests.iter().all(|r| !r.url.as_str().contains("key-")));
    for key in ["key-a", "key-b", "key-c"] {
        assert!(keys.iter().any(|k| k == key), "{key} never used");
    }
}

#[test]
fn concurrent_callers_share_one_rotator() {
    tokio_test::block_on(async {
        let set = CredentialSet::new("groq", "GROQ_API_KEY", vec!["g1".into(), "g2".into()]).unwrap();
        let rotator = Arc::new(CredentialRotator::new("groq", set));

        let handles: Vec<_> = (0..64)
            .map(|_| {
                let rotator = Arc::clone(&rotator);
                tokio::spawn(async move { rotator.next_credential().to_string() })
            })
            .collect();
        for handle in handles {
            let key = handle.await.unwrap();
            assert!(key == "g1" || key == "g2");
        }

        let usage = rotator.usage();
        assert_eq!(usage.iter().sum::<u64>(), 64);
        assert!(usage.iter().all(|&n| n > 0));
    });
}
