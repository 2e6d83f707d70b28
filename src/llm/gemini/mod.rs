//! Google Gemini provider.
//!
//! Every call takes the next key from the provider's [`CredentialRotator`]
//! and sends it in the `x-goog-api-key` header, so keys never appear in
//! request URLs or in reqwest error messages.

use crate::error::LlmError;
use crate::llm::{
    api_error, build_provider_client, rotator::CredentialRotator, traits::Provider,
    types::GenerationParams,
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

mod types;
use types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    base_url: String,
    rotator: Arc<CredentialRotator>,
    client: Client,
}

impl GeminiProvider {
    pub fn new(base_url: &str, rotator: Arc<CredentialRotator>) -> Self {
        Self::with_client(base_url, rotator, build_provider_client())
    }

    pub fn with_client(base_url: &str, rotator: Arc<CredentialRotator>, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            rotator,
            client,
        }
    }

    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_name(model)
        )
    }

    fn build_request(prompt: &str, params: &GenerationParams) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        }
    }

    fn extract_text(result: &GenerateContentResponse) -> anyhow::Result<String> {
        if let Some(err) = result.error.as_ref() {
            let message = crate::llm::sanitize_api_error(&err.message);
            if err.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
                return Err(LlmError::QuotaExhausted {
                    provider: "gemini".into(),
                    message,
                }
                .into());
            }
            return Err(LlmError::Request {
                provider: "gemini".into(),
                message,
            }
            .into());
        }

        let candidate = result.candidates.first();
        let text = candidate
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let finish = candidate
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none");
            tracing::debug!(finish_reason = finish, "Gemini returned no text");
            return Err(LlmError::EmptyAnswer {
                provider: "gemini".into(),
            }
            .into());
        }

        Ok(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<String> {
        let request = Self::build_request(prompt, params);
        let api_key = self.rotator.next_credential();

        let response = self
            .client
            .post(self.generate_url(model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request {
                provider: "gemini".into(),
                message: crate::llm::sanitize_api_error(&e.without_url().to_string()),
            })?;

        if !response.status().is_success() {
            return Err(api_error("gemini", response).await);
        }

        let result: GenerateContentResponse = response.json().await?;
        if let Some(usage) = result.usage_metadata.as_ref() {
            tracing::debug!(
                input_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }
        Self::extract_text(&result)
    }

    async fn warmup(&self) -> anyhow::Result<()> {
        self.client.get(&self.base_url).send().await?;
        Ok(())
    }

    fn rotator(&self) -> Option<&Arc<CredentialRotator>> {
        Some(&self.rotator)
    }
}
