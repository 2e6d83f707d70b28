use crate::error::ConfigError;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Immutable, non-empty set of interchangeable credentials for one provider.
#[derive(Clone)]
pub struct CredentialSet {
    credentials: Vec<String>,
}

impl CredentialSet {
    pub fn new(provider: &str, prefix: &str, credentials: Vec<String>) -> Result<Self, ConfigError> {
        let mut unique: Vec<String> = Vec::with_capacity(credentials.len());
        for (slot, credential) in credentials.iter().enumerate() {
            let credential = credential.trim();
            if credential.is_empty() {
                continue;
            }
            if unique.iter().any(|seen| seen == credential) {
                tracing::warn!(
                    provider,
                    prefix,
                    slot = slot + 1,
                    "Duplicate credential ignored"
                );
                continue;
            }
            unique.push(credential.to_string());
        }
        let credentials = unique;

        if credentials.is_empty() {
            return Err(ConfigError::MissingCredentials {
                provider: provider.to_string(),
                prefix: prefix.to_string(),
            });
        }

        Ok(Self { credentials })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    fn get(&self, index: usize) -> &str {
        &self.credentials[index]
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("len", &self.credentials.len())
            .finish_non_exhaustive()
    }
}

/// Per-slot dispense counts for one rotator. Never carries credential values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialUsage {
    pub provider: String,
    pub slots: usize,
    pub dispensed: Vec<u64>,
}

#[derive(Debug)]
struct RotationState {
    last: Option<usize>,
    dispensed: Vec<u64>,
}

/// Hands out one credential per outbound call.
///
/// With two or more credentials the same one is never dispensed twice in a
/// row: each pick is uniform over every credential except the previous one,
/// which converges to uniform usage without the lock-step alternation plain
/// round-robin shows under bursty concurrent callers.
///
/// The state mutex is held only while picking; callers use the returned
/// credential after the lock is released.
pub struct CredentialRotator {
    label: String,
    credentials: CredentialSet,
    state: Mutex<RotationState>,
}

impl CredentialRotator {
    pub fn new(label: impl Into<String>, credentials: CredentialSet) -> Self {
        let label = label.into();
        let count = credentials.len();
        tracing::info!(
            provider = label.as_str(),
            credentials = count,
            "Credential rotator initialized"
        );
        Self {
            label,
            state: Mutex::new(RotationState {
                last: None,
                dispensed: vec![0; count],
            }),
            credentials,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Dispense the credential to use for the next call.
    pub fn next_credential(&self) -> &str {
        let index = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let index = pick_index(self.credentials.len(), state.last, &mut rand::rng());
            state.last = Some(index);
            state.dispensed[index] += 1;
            index
        };

        tracing::trace!(provider = self.label.as_str(), slot = index + 1, "Credential dispensed");
        self.credentials.get(index)
    }

    /// Number of times each credential slot has been dispensed, in slot order.
    pub fn usage(&self) -> Vec<u64> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .dispensed
            .clone()
    }

    pub fn snapshot(&self) -> CredentialUsage {
        CredentialUsage {
            provider: self.label().to_string(),
            slots: self.len(),
            dispensed: self.usage(),
        }
    }
}

impl fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRotator")
            .field("label", &self.label)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Uniform pick over `0..len`, excluding `last` when `len > 1`.
///
/// Draws from the `len - 1` remaining slots and shifts past the excluded one,
/// so no candidate list is allocated.
fn pick_index<R: Rng + ?Sized>(len: usize, last: Option<usize>, rng: &mut R) -> usize {
    match (len, last) {
        (0 | 1, _) => 0,
        (_, None) => rng.random_range(0..len),
        (_, Some(last)) => {
            let drawn = rng.random_range(0..len - 1);
            if drawn >= last { drawn + 1 } else { drawn }
        }
    }
}
