use crate::error::LlmError;
use serde::{Deserialize, Serialize};

/// Fixed answer returned when every generation path has failed.
pub const DEGRADATION_MESSAGE: &str = "I'm sorry, I'm experiencing technical difficulties with both primary and fallback language models. Please try again later.";

/// One question against one retrieved context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub context: String,
    pub question: String,
}

impl InvocationRequest {
    pub fn new(context: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            question: question.into(),
        }
    }
}

/// Sampling parameters sent with every generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    QuotaExhausted,
    Invocation,
}

impl FailureKind {
    pub fn classify(err: &anyhow::Error) -> Self {
        if let Some(LlmError::QuotaExhausted { .. }) = err.downcast_ref::<LlmError>() {
            return Self::QuotaExhausted;
        }
        if is_quota_exhausted(&err.to_string()) {
            return Self::QuotaExhausted;
        }
        Self::Invocation
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::QuotaExhausted => "quota_exhausted",
            Self::Invocation => "invocation",
        }
    }
}

pub(crate) fn is_quota_exhausted(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("resource_exhausted")
        || lower.contains("insufficient_quota")
        || lower.contains("exceeded your current quota")
        || lower.contains("(429)")
        || lower.contains("429 too many requests")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub kind: FailureKind,
    pub reason: String,
}

impl ProviderFailure {
    pub fn from_error(provider: &str, err: &anyhow::Error) -> Self {
        Self {
            provider: provider.to_string(),
            kind: FailureKind::classify(err),
            reason: err.to_string(),
        }
    }
}

/// Tagged result of a single provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Answered(String),
    Recoverable(ProviderFailure),
    Terminal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Primary,
    Fallback,
    Degraded,
}

/// Final result of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedAnswer {
    pub text: String,
    pub source: AnswerSource,
}

impl RoutedAnswer {
    pub fn degraded() -> Self {
        Self {
            text: DEGRADATION_MESSAGE.to_string(),
            source: AnswerSource::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == AnswerSource::Degraded
    }
}
