// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod prompt;
pub mod rotator;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Routing ─────────────────────────────────────────────────────────────────
pub mod factory;
pub mod router;

// ── Provider implementations ────────────────────────────────────────────────
pub mod compatible;
pub mod gemini;

// ── Infrastructure re-exports ───────────────────────────────────────────────
pub use http_client::{build_provider_client, build_provider_client_with_timeout};
pub use prompt::{DOCUMENT_QA_TEMPLATE, PromptTemplate};
pub use rotator::{CredentialRotator, CredentialSet, CredentialUsage};
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::Provider;
pub use types::{
    AnswerSource, DEGRADATION_MESSAGE, FailureKind, GenerationParams, InvocationOutcome,
    InvocationRequest, ProviderFailure, RoutedAnswer,
};

// ── Provider + router re-exports ────────────────────────────────────────────
pub use compatible::OpenAiCompatibleProvider;
pub use factory::{build_router, build_router_from, create_target, rotator_for};
pub use gemini::GeminiProvider;
pub use router::{ProviderFailoverRouter, RouteStage, RouteStep, RouteTarget, next_step};
