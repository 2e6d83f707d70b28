use super::schema::{Config, ProviderKind};
use crate::error::ConfigError;
use crate::llm::rotator::CredentialSet;

/// Collect `{prefix}_1`, `{prefix}_2`, ... up to `max_slots`, skipping blank
/// and missing slots. When no numbered slot is set the bare `{prefix}`
/// variable is used as a single credential.
pub fn collect_credential_slots<F>(prefix: &str, max_slots: usize, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let numbered: Vec<String> = (1..=max_slots)
        .filter_map(|slot| lookup(&format!("{prefix}_{slot}")))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();

    if !numbered.is_empty() {
        return numbered;
    }

    lookup(prefix)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .into_iter()
        .collect()
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl Config {
    /// Label, env prefix and slot count for a provider kind.
    pub fn credential_source(&self, kind: ProviderKind) -> (&str, &str, usize) {
        match kind {
            ProviderKind::Gemini => ("gemini", &self.gemini.key_prefix, self.gemini.max_key_slots),
            ProviderKind::OpenAiCompatible => (
                &self.openai_compatible.name,
                &self.openai_compatible.key_prefix,
                self.openai_compatible.max_key_slots,
            ),
        }
    }

    /// Credentials for `kind` read from the process environment.
    pub fn credentials_for(&self, kind: ProviderKind) -> Result<CredentialSet, ConfigError> {
        self.credentials_with(kind, env_lookup)
    }

    pub fn credentials_with<F>(&self, kind: ProviderKind, lookup: F) -> Result<CredentialSet, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (label, prefix, max_slots) = self.credential_source(kind);
        let values = collect_credential_slots(prefix, max_slots, lookup);
        CredentialSet::new(label, prefix, values)
    }
}
