pub mod credentials;
mod env_overrides;
mod loader;
pub mod schema;
#[cfg(test)]
mod test_env;

pub use credentials::collect_credential_slots;
pub use schema::{
    CacheConfig, CompatibleConfig, Config, GatewayConfig, GeminiConfig, ProviderKind,
    RetrievalConfig, ScorePolicyKind,
};
