use crate::config::{Config, ProviderKind, collect_credential_slots};
use crate::retrieval::DocumentId;

fn credential_line(config: &Config, kind: ProviderKind) -> String {
    let (label, prefix, max_slots) = config.credential_source(kind);
    let slots = collect_credential_slots(prefix, max_slots, |name| std::env::var(name).ok()).len();
    format!("  {label:<10} {slots} key(s) from {prefix}_1..{prefix}_{max_slots}")
}

/// Human-readable summary of the resolved configuration. Never prints
/// credential values, only how many slots are populated.
pub fn render_status(config: &Config, documents: &[DocumentId]) -> String {
    let mut lines = vec![
        "◆ docqa status".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!(
            "Document    {}",
            config
                .document_path
                .as_deref()
                .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string())
        ),
        format!(
            "Store       {}",
            config
                .store_path
                .as_deref()
                .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string())
        ),
        String::new(),
        format!("Primary     {}", config.primary_provider),
        format!(
            "Fallback    {}",
            config
                .fallback_provider
                .map_or_else(|| "none".to_string(), |kind| kind.to_string())
        ),
        format!("Gemini      {}", config.gemini.model),
        format!(
            "Compatible  {} ({})",
            config.openai_compatible.model, config.openai_compatible.base_url
        ),
        format!("Scoring     {:?}", config.retrieval.score_policy),
        format!(
            "Cache       capacity {}, ttl {}",
            config.cache.capacity,
            config
                .cache
                .ttl_secs
                .map_or_else(|| "none".to_string(), |s| format!("{s}s"))
        ),
        String::new(),
        "Credentials".to_string(),
        credential_line(config, ProviderKind::Gemini),
        credential_line(config, ProviderKind::OpenAiCompatible),
        String::new(),
    ];

    if documents.is_empty() {
        lines.push("Ingested    (none)".to_string());
    } else {
        lines.push(format!("Ingested    {}", documents.len()));
        lines.extend(documents.iter().map(|id| format!("  {id}")));
    }

    lines.join("\n")
}
