use super::rotator::CredentialRotator;
use super::types::GenerationParams;
use async_trait::async_trait;
use std::sync::Arc;

/// A text-generation backend.
///
/// Implementations draw their own credential for every call and return an
/// error for anything that is not a usable, non-empty answer. Classification
/// of the error is left to the router.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "gemini", "groq").
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        params: &GenerationParams,
    ) -> anyhow::Result<String>;

    /// Warm up the HTTP connection pool.
    /// Default implementation is a no-op.
    async fn warmup(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Rotator this provider draws keys from, if it uses one.
    fn rotator(&self) -> Option<&Arc<CredentialRotator>> {
        None
    }
}
