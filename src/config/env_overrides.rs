use super::schema::{Config, ProviderKind};
use std::path::PathBuf;

impl Config {
    /// Apply `DOCQA_*`, `DOC_PATH` and `STORE_PATH` environment variables on
    /// top of whatever the config file provided. Unparseable values are
    /// logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("DOCQA_PRIMARY_PROVIDER")
            && !provider.is_empty()
        {
            match provider.parse::<ProviderKind>() {
                Ok(kind) => self.primary_provider = kind,
                Err(e) => tracing::warn!("Ignoring DOCQA_PRIMARY_PROVIDER: {e}"),
            }
        }

        if let Ok(provider) = std::env::var("DOCQA_FALLBACK_PROVIDER")
            && !provider.is_empty()
        {
            if provider.eq_ignore_ascii_case("none") {
                self.fallback_provider = None;
            } else {
                match provider.parse::<ProviderKind>() {
                    Ok(kind) => self.fallback_provider = Some(kind),
                    Err(e) => tracing::warn!("Ignoring DOCQA_FALLBACK_PROVIDER: {e}"),
                }
            }
        }

        if let Ok(path) = std::env::var("DOC_PATH")
            && !path.is_empty()
        {
            self.document_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("STORE_PATH")
            && !path.is_empty()
        {
            self.store_path = Some(PathBuf::from(path));
        }

        if let Ok(model) = std::env::var("DOCQA_GEMINI_MODEL")
            && !model.is_empty()
        {
            self.gemini.model = model;
        }

        if let Ok(model) = std::env::var("DOCQA_FALLBACK_MODEL")
            && !model.is_empty()
        {
            self.openai_compatible.model = model;
        }

        if let Ok(url) = std::env::var("DOCQA_FALLBACK_BASE_URL")
            && !url.is_empty()
        {
            self.openai_compatible.base_url = url;
        }

        if let Ok(temp_str) = std::env::var("DOCQA_TEMPERATURE")
            && let Ok(temp) = temp_str.parse::<f64>()
        {
            self.generation.temperature = temp;
        }

        if let Ok(secs) = std::env::var("DOCQA_PROVIDER_TIMEOUT_SECS")
            && let Ok(secs) = secs.parse::<u64>()
        {
            self.provider_timeout_secs = secs;
        }

        if let Ok(port_str) = std::env::var("DOCQA_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
            && let Ok(port) = port_str.parse::<u16>()
        {
            self.gateway.port = port;
        }

        if let Ok(host) = std::env::var("DOCQA_GATEWAY_HOST").or_else(|_| std::env::var("HOST"))
            && !host.is_empty()
        {
            self.gateway.host = host;
        }
    }
}
