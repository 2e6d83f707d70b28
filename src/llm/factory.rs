use super::compatible::OpenAiCompatibleProvider;
use super::gemini::GeminiProvider;
use super::http_client::build_provider_client_with_timeout;
use super::prompt::PromptTemplate;
use super::rotator::CredentialRotator;
use super::router::{ProviderFailoverRouter, RouteTarget};
use crate::config::{Config, ProviderKind};
use crate::error::{ConfigError, DocQaError};
use std::sync::Arc;

/// Rotator over the environment credentials configured for `kind`.
pub fn rotator_for(config: &Config, kind: ProviderKind) -> Result<Arc<CredentialRotator>, ConfigError> {
    let set = config.credentials_for(kind)?;
    let (label, prefix, _) = config.credential_source(kind);
    tracing::info!(provider = label, prefix, slots = set.len(), "Loaded provider credentials");
    Ok(Arc::new(CredentialRotator::new(label, set)))
}

/// Provider + model pair for `kind`, drawing keys from `rotator`.
pub fn create_target(config: &Config, kind: ProviderKind, rotator: Arc<CredentialRotator>) -> RouteTarget {
    let client = build_provider_client_with_timeout(config.provider_timeout_secs);
    match kind {
        ProviderKind::Gemini => RouteTarget::new(
            Arc::new(GeminiProvider::with_client(&config.gemini.base_url, rotator, client)),
            config.gemini.model.clone(),
        ),
        ProviderKind::OpenAiCompatible => {
            let compat = &config.openai_compatible;
            RouteTarget::new(
                Arc::new(OpenAiCompatibleProvider::with_client(
                    &compat.name,
                    &compat.base_url,
                    rotator,
                    client,
                )),
                compat.model.clone(),
            )
        }
    }
}

/// Build the failover router from config and environment credentials.
pub fn build_router(config: &Config) -> Result<ProviderFailoverRouter, DocQaError> {
    build_router_from(config, |kind| rotator_for(config, kind))
}

/// Build the failover router with rotators supplied by `rotators`.
///
/// Missing primary credentials are fatal. Missing fallback credentials
/// disable failover with a warning.
pub fn build_router_from<F>(config: &Config, rotators: F) -> Result<ProviderFailoverRouter, DocQaError>
where
    F: Fn(ProviderKind) -> Result<Arc<CredentialRotator>, ConfigError>,
{
    let primary_kind = config.primary_provider;
    let primary = create_target(config, primary_kind, rotators(primary_kind)?);

    let fallback = match config.fallback_provider {
        Some(kind) => match rotators(kind) {
            Ok(rotator) => Some(create_target(config, kind, rotator)),
            Err(e) => {
                tracing::warn!(provider = %kind, "Fallback provider disabled: {e}");
                None
            }
        },
        None => None,
    };

    let prompt = PromptTemplate::new()?;
    tracing::info!(
        primary = primary.name(),
        fallback = fallback.as_ref().map_or("none", RouteTarget::name),
        "Provider failover router ready"
    );
    Ok(ProviderFailoverRouter::new(
        primary,
        fallback,
        prompt,
        config.generation,
    ))
}
