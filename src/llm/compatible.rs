//! Generic OpenAI-compatible provider.
//! Groq, OpenRouter, Together, Mistral and OpenAI itself all accept the same
//! `/chat/completions` request, so one implementation serves as the fallback
//! path for any of them.

use crate::error::LlmError;
use crate::llm::{
    api_error, build_provider_client, rotator::CredentialRotator, traits::Provider,
    types::GenerationParams,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_COMPATIBLE_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub struct OpenAiCompatibleProvider {
    pub(crate) name: String,
    rotator: Arc<CredentialRotator>,
    /// Pre-computed chat completions URL (avoids `format!` per request).
    cached_chat_url: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, rotator: Arc<CredentialRotator>) -> Self {
        Self::with_client(name, base_url, rotator, build_provider_client())
    }

    pub fn with_client(
        name: &str,
        base_url: &str,
        rotator: Arc<CredentialRotator>,
        client: Client,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let cached_chat_url = if base_url.ends_with("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            name: name.to_string(),
            rotator,
            cached_chat_url,
            client,
        }
    }

    fn chat_completions_url(&self) -> &str {
        &self.cached_chat_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_chat_text(response: &ChatResponse, provider_name: &str) -> anyhow::Result<String> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            LlmError::EmptyAnswer {
                provider: provider_name.to_string(),
            }
            .into()
        })
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        let api_key = self.rotator.next_credential();
        let response = self
            .client
            .post(self.chat_completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Request {
                provider: self.name.clone(),
                message: crate::llm::sanitize_api_error(&e.to_string()),
            })?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| LlmError::Request {
            provider: self.name.clone(),
            message: format!("invalid JSON response: {e}"),
        })?;
        extract_chat_text(&chat_response, &self.name)
    }

    fn rotator(&self) -> Option<&Arc<CredentialRotator>> {
        Some(&self.rotator)
    }
}
