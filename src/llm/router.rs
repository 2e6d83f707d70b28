use super::prompt::PromptTemplate;
use super::rotator::CredentialUsage;
use super::traits::Provider;
use super::types::{
    AnswerSource, DEGRADATION_MESSAGE, GenerationParams, InvocationOutcome, InvocationRequest,
    ProviderFailure, RoutedAnswer,
};
use std::sync::Arc;

/// A provider paired with the model it should be asked for.
#[derive(Clone)]
pub struct RouteTarget {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

impl RouteTarget {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStage {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStep {
    Done(RoutedAnswer),
    TryFallback(ProviderFailure),
}

/// Decide what happens after an attempt at `stage`.
///
/// `has_fallback` is false when no secondary provider is configured, in which
/// case a recoverable primary failure degrades immediately.
pub fn next_step(stage: RouteStage, outcome: InvocationOutcome, has_fallback: bool) -> RouteStep {
    match (stage, outcome) {
        (RouteStage::Primary, InvocationOutcome::Answered(text)) => RouteStep::Done(RoutedAnswer {
            text,
            source: AnswerSource::Primary,
        }),
        (RouteStage::Fallback, InvocationOutcome::Answered(text)) => {
            RouteStep::Done(RoutedAnswer {
                text,
                source: AnswerSource::Fallback,
            })
        }
        (RouteStage::Primary, InvocationOutcome::Recoverable(failure)) if has_fallback => {
            RouteStep::TryFallback(failure)
        }
        (_, InvocationOutcome::Terminal(text)) => RouteStep::Done(RoutedAnswer {
            text,
            source: AnswerSource::Degraded,
        }),
        (_, InvocationOutcome::Recoverable(_)) => RouteStep::Done(RoutedAnswer::degraded()),
    }
}

/// Primary → fallback → degradation message. Never returns an error.
pub struct ProviderFailoverRouter {
    primary: RouteTarget,
    fallback: Option<RouteTarget>,
    prompt: PromptTemplate,
    params: GenerationParams,
}

impl ProviderFailoverRouter {
    pub fn new(
        primary: RouteTarget,
        fallback: Option<RouteTarget>,
        prompt: PromptTemplate,
        params: GenerationParams,
    ) -> Self {
        Self {
            primary,
            fallback,
            prompt,
            params,
        }
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn fallback_name(&self) -> Option<&str> {
        self.fallback.as_ref().map(RouteTarget::name)
    }

    /// Dispense counts of every rotator behind the primary and fallback.
    pub fn credential_usage(&self) -> Vec<CredentialUsage> {
        std::iter::once(&self.primary)
            .chain(self.fallback.as_ref())
            .filter_map(|target| target.provider.rotator())
            .map(|rotator| rotator.snapshot())
            .collect()
    }

    pub async fn warmup(&self) {
        let targets = std::iter::once(&self.primary).chain(self.fallback.as_ref());
        for target in targets {
            tracing::info!(provider = target.name(), "Warming up provider connection pool");
            if let Err(e) = target.provider.warmup().await {
                tracing::warn!(provider = target.name(), "Warmup failed (non-fatal): {e}");
            }
        }
    }

    /// Answer `question` from `context`, always producing user-facing text.
    pub async fn answer(&self, context: &str, question: &str) -> String {
        self.route(&InvocationRequest::new(context, question))
            .await
            .text
    }

    pub async fn route(&self, request: &InvocationRequest) -> RoutedAnswer {
        let prompt = match self.prompt.render(request) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!("Prompt rendering failed: {e}");
                return RoutedAnswer::degraded();
            }
        };

        let outcome = self.attempt_primary(&prompt).await;
        let failure = match next_step(RouteStage::Primary, outcome, self.fallback.is_some()) {
            RouteStep::Done(answer) => {
                if answer.is_degraded() {
                    tracing::error!(
                        provider = self.primary.name(),
                        "Primary provider failed and no fallback is configured"
                    );
                }
                return answer;
            }
            RouteStep::TryFallback(failure) => failure,
        };

        let Some(fallback) = self.fallback.as_ref() else {
            return RoutedAnswer::degraded();
        };

        tracing::warn!(
            provider = failure.provider.as_str(),
            kind = failure.kind.as_str(),
            fallback = fallback.name(),
            "Primary provider failed, switching to fallback provider"
        );

        let outcome = self.attempt_fallback(fallback, &prompt).await;
        match next_step(RouteStage::Fallback, outcome, false) {
            RouteStep::Done(answer) => answer,
            RouteStep::TryFallback(_) => RoutedAnswer::degraded(),
        }
    }

    async fn attempt_primary(&self, prompt: &str) -> InvocationOutcome {
        match self.invoke(&self.primary, prompt).await {
            Ok(text) => InvocationOutcome::Answered(text),
            Err(e) => {
                let failure = ProviderFailure::from_error(self.primary.name(), &e);
                tracing::debug!(
                    provider = failure.provider.as_str(),
                    reason = failure.reason.as_str(),
                    "Primary attempt failed"
                );
                InvocationOutcome::Recoverable(failure)
            }
        }
    }

    async fn attempt_fallback(&self, fallback: &RouteTarget, prompt: &str) -> InvocationOutcome {
        match self.invoke(fallback, prompt).await {
            Ok(text) => {
                tracing::info!(provider = fallback.name(), "Fallback provider answered");
                InvocationOutcome::Answered(text)
            }
            Err(e) => {
                let failure = ProviderFailure::from_error(fallback.name(), &e);
                tracing::error!(
                    provider = failure.provider.as_str(),
                    kind = failure.kind.as_str(),
                    reason = failure.reason.as_str(),
                    "Fallback provider failed, returning degradation message"
                );
                InvocationOutcome::Terminal(DEGRADATION_MESSAGE.to_string())
            }
        }
    }

    async fn invoke(&self, target: &RouteTarget, prompt: &str) -> anyhow::Result<String> {
        let text = target
            .provider
            .generate(prompt, &target.model, &self.params)
            .await?;
        if text.trim().is_empty() {
            return Err(crate::error::LlmError::EmptyAnswer {
                provider: target.name().to_string(),
            }
            .into());
        }
        Ok(text)
    }
}
