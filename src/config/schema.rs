use crate::error::ConfigError;
use crate::llm::types::GenerationParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Gemini,
    #[serde(alias = "openai", alias = "compatible")]
    OpenAiCompatible,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAiCompatible => "openai_compatible",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" | "google-gemini" => Ok(Self::Gemini),
            "openai" | "openai_compatible" | "openai-compatible" | "compatible" => {
                Ok(Self::OpenAiCompatible)
            }
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was read from - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default = "default_primary_provider")]
    pub primary_provider: ProviderKind,

    /// `None` disables failover.
    #[serde(default = "default_fallback_provider")]
    pub fallback_provider: Option<ProviderKind>,

    #[serde(default)]
    pub document_path: Option<PathBuf>,

    #[serde(default)]
    pub store_path: Option<PathBuf>,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub openai_compatible: CompatibleConfig,

    #[serde(default)]
    pub generation: GenerationParams,

    /// Per-call HTTP timeout for generation and embedding requests.
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_primary_provider() -> ProviderKind {
    ProviderKind::Gemini
}

fn default_provider_timeout_secs() -> u64 {
    crate::llm::http_client::DEFAULT_PROVIDER_TIMEOUT_SECS
}

#[allow(clippy::unnecessary_wraps)]
fn default_fallback_provider() -> Option<ProviderKind> {
    Some(ProviderKind::OpenAiCompatible)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            primary_provider: default_primary_provider(),
            fallback_provider: default_fallback_provider(),
            document_path: None,
            store_path: None,
            gemini: GeminiConfig::default(),
            openai_compatible: CompatibleConfig::default(),
            generation: GenerationParams::default(),
            provider_timeout_secs: default_provider_timeout_secs(),
            retrieval: RetrievalConfig::default(),
            cache: CacheConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Credential slots are read from `{key_prefix}_1..={max_key_slots}`.
    #[serde(default = "default_gemini_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_max_key_slots")]
    pub max_key_slots: usize,
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_embedding_model() -> String {
    "text-embedding-004".into()
}

fn default_gemini_base_url() -> String {
    crate::llm::gemini::DEFAULT_GEMINI_BASE_URL.into()
}

fn default_gemini_key_prefix() -> String {
    "GEMINI_API_KEY".into()
}

fn default_max_key_slots() -> usize {
    8
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
            embedding_model: default_embedding_model(),
            base_url: default_gemini_base_url(),
            key_prefix: default_gemini_key_prefix(),
            max_key_slots: default_max_key_slots(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibleConfig {
    /// Label used in logs and error messages.
    #[serde(default = "default_compatible_name")]
    pub name: String,
    #[serde(default = "default_compatible_model")]
    pub model: String,
    #[serde(default = "default_compatible_base_url")]
    pub base_url: String,
    #[serde(default = "default_compatible_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_max_key_slots")]
    pub max_key_slots: usize,
}

fn default_compatible_name() -> String {
    "groq".into()
}

fn default_compatible_model() -> String {
    "llama-3.3-70b-versatile".into()
}

fn default_compatible_base_url() -> String {
    crate::llm::compatible::DEFAULT_COMPATIBLE_BASE_URL.into()
}

fn default_compatible_key_prefix() -> String {
    "GROQ_API_KEY".into()
}

impl Default for CompatibleConfig {
    fn default() -> Self {
        Self {
            name: default_compatible_name(),
            model: default_compatible_model(),
            base_url: default_compatible_base_url(),
            key_prefix: default_compatible_key_prefix(),
            max_key_slots: default_max_key_slots(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorePolicyKind {
    Raw,
    AbsoluteWhenNegative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Candidates fetched from the store before ranking.
    #[serde(default = "default_candidate_k")]
    pub candidate_k: usize,
    /// Chunks kept as generation context after ranking.
    #[serde(default = "default_context_k")]
    pub context_k: usize,
    #[serde(default = "default_score_policy")]
    pub score_policy: ScorePolicyKind,
}

fn default_chunk_size() -> usize {
    1_000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_candidate_k() -> usize {
    8
}

fn default_context_k() -> usize {
    4
}

fn default_score_policy() -> ScorePolicyKind {
    ScorePolicyKind::AbsoluteWhenNegative
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            candidate_k: default_candidate_k(),
            context_k: default_context_k(),
            score_policy: default_score_policy(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    /// Entries older than this are treated as misses. `None` keeps them
    /// until evicted or invalidated.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

fn default_cache_capacity() -> usize {
    512
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    7860
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

impl Config {
    /// Reject values that would break retrieval or generation at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Validation(format!(
                "generation.temperature must be within 0.0..=2.0 (got {})",
                self.generation.temperature
            )));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(ConfigError::Validation(
                "generation.max_output_tokens must be positive".into(),
            ));
        }
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "provider_timeout_secs must be positive".into(),
            ));
        }
        if self.retrieval.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "retrieval.chunk_size must be positive".into(),
            ));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(ConfigError::Validation(
                "retrieval.chunk_overlap must be smaller than retrieval.chunk_size".into(),
            ));
        }
        if self.retrieval.context_k == 0 || self.retrieval.candidate_k < self.retrieval.context_k {
            return Err(ConfigError::Validation(
                "retrieval.candidate_k must be >= retrieval.context_k >= 1".into(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.capacity must be positive".into(),
            ));
        }
        if self.fallback_provider == Some(self.primary_provider) {
            return Err(ConfigError::Validation(format!(
                "fallback_provider must differ from primary_provider ({})",
                self.primary_provider
            )));
        }
        Ok(())
    }

    pub fn require_store_path(&self) -> Result<&PathBuf, ConfigError> {
        self.store_path
            .as_ref()
            .ok_or(ConfigError::MissingSetting("STORE_PATH"))
    }

    pub fn require_document_path(&self) -> Result<&PathBuf, ConfigError> {
        self.document_path
            .as_ref()
            .ok_or(ConfigError::MissingSetting("DOC_PATH"))
    }
}
