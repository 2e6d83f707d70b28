use crate::llm::{CredentialRotator, api_error, build_provider_client, sanitize_api_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trait for embedding providers: convert text to vectors
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Model identifier recorded alongside stored vectors
    fn model(&self) -> &str;

    /// Embed a batch of texts into vectors
    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut results = self.embed(&[text]).await?;
        results
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding result"))
    }
}

/// `batchEmbedContents` accepts at most this many requests per call.
const MAX_BATCH: usize = 100;

/// Gemini `batchEmbedContents`, keyed from the shared Gemini rotator.
pub struct GeminiEmbedding {
    client: reqwest::Client,
    base_url: String,
    model: String,
    rotator: Arc<CredentialRotator>,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: EmbedContent<'a>,
}

#[derive(Debug, Serialize)]
struct EmbedContent<'a> {
    parts: [EmbedPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct EmbedPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbedding {
    pub fn new(base_url: &str, model: &str, rotator: Arc<CredentialRotator>) -> Self {
        Self::with_client(base_url, model, rotator, build_provider_client())
    }

    pub fn with_client(
        base_url: &str,
        model: &str,
        rotator: Arc<CredentialRotator>,
        client: reqwest::Client,
    ) -> Self {
        let model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            rotator,
        }
    }

    fn batch_url(&self) -> String {
        format!("{}/{}:batchEmbedContents", self.base_url, self.model)
    }

    async fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|&text| EmbedRequest {
                    model: &self.model,
                    content: EmbedContent {
                        parts: [EmbedPart { text }],
                    },
                })
                .collect(),
        };

        let resp = self
            .client
            .post(self.batch_url())
            .header("x-goog-api-key", self.rotator.next_credential())
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!(sanitize_api_error(&e.without_url().to_string())))?;

        if !resp.status().is_success() {
            return Err(api_error("gemini-embedding", resp).await);
        }

        let parsed: BatchEmbedResponse = resp.json().await?;
        if parsed.embeddings.len() != texts.len() {
            anyhow::bail!(
                "embedding count mismatch: sent {}, received {}",
                texts.len(),
                parsed.embeddings.len()
            );
        }
        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedding {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::CredentialSet;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn rotator() -> Arc<CredentialRotator> {
        let set = CredentialSet::new("gemini", "GEMINI_API_KEY", vec!["embed-key".into()]).unwrap();
        Arc::new(CredentialRotator::new("gemini", set))
    }

    /// Echoes one two-dimensional vector per request, `[index, text length]`.
    fn echo_vectors(req: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        let embeddings: Vec<serde_json::Value> = body["requests"]
            .as_array()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let len = r["content"]["parts"][0]["text"].as_str().unwrap().len();
                serde_json::json!({"values": [i, len]})
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "embeddings": embeddings }))
    }

    #[tokio::test]
    async fn embeds_batch_with_header_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/text-embedding-004:batchEmbedContents"))
            .and(header("x-goog-api-key", "embed-key"))
            .respond_with(echo_vectors)
            .mount(&server)
            .await;

        let embedder = GeminiEmbedding::new(&server.uri(), "text-embedding-004", rotator());
        let vectors = embedder.embed(&["a", "bbb"]).await.unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 3.0]]);
        assert_eq!(embedder.model(), "models/text-embedding-004");
    }

    #[tokio::test]
    async fn large_inputs_are_split_into_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(echo_vectors)
            .expect(2)
            .mount(&server)
            .await;

        let embedder = GeminiEmbedding::new(&server.uri(), "text-embedding-004", rotator());
        let texts = vec!["x"; MAX_BATCH + 5];
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), MAX_BATCH + 5);
    }

    #[tokio::test]
    async fn count_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"embeddings": []})),
            )
            .mount(&server)
            .await;

        let embedder = GeminiEmbedding::new(&server.uri(), "text-embedding-004", rotator());
        assert!(embedder.embed_one("hello").await.is_err());
    }
}
