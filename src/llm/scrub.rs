use crate::error::LlmError;
use std::borrow::Cow;

const MAX_API_ERROR_CHARS: usize = 300;
const REDACTED: &str = "[REDACTED]";

/// Key prefixes issued by the providers docqa talks to.
const PREFIX_PATTERNS: [&str; 5] = ["AIza", "sk-or-", "sk-", "gsk_", "ya29."];

/// Header, query and JSON markers that precede a credential value.
const MARKER_PATTERNS: [&str; 8] = [
    "Authorization: Bearer ",
    "authorization: bearer ",
    "x-goog-api-key: ",
    "key=",
    "api_key=",
    "\"api_key\":\"",
    "\"key\":\"",
    "\"access_token\":\"",
];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+' | '/' | '=')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map_or(input.len(), |(i, _)| from + i)
}

/// Redact the token following every occurrence of `marker`.
///
/// For bare prefixes (`keep_marker == false`) the prefix itself is part of the
/// secret and is redacted too.
fn scrub_after(scrubbed: &mut String, marker: &str, keep_marker: bool) {
    let mut search_from = 0;
    while let Some(rel) = scrubbed[search_from..].find(marker) {
        let start = search_from + rel;
        let content_start = start + marker.len();
        let end = token_end(scrubbed, content_start);

        if end == content_start {
            search_from = content_start;
            continue;
        }

        let replace_from = if keep_marker { content_start } else { start };
        scrubbed.replace_range(replace_from..end, REDACTED);
        search_from = replace_from + REDACTED.len();
    }
}

/// Scrub credential-like tokens from provider error text.
pub fn scrub_secret_patterns(input: &str) -> Cow<'_, str> {
    let needs_scrub = PREFIX_PATTERNS
        .iter()
        .chain(MARKER_PATTERNS.iter())
        .any(|pattern| input.contains(pattern));
    if !needs_scrub {
        return Cow::Borrowed(input);
    }

    let mut scrubbed = input.to_string();
    for marker in MARKER_PATTERNS {
        scrub_after(&mut scrubbed, marker, true);
    }
    for prefix in PREFIX_PATTERNS {
        scrub_after(&mut scrubbed, prefix, false);
    }
    Cow::Owned(scrubbed)
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed.into_owned();
    }

    let truncated: String = scrubbed.chars().take(MAX_API_ERROR_CHARS).collect();
    format!("{truncated}...")
}

/// Build a sanitized, classified provider error from a failed HTTP response.
///
/// HTTP 429 and `RESOURCE_EXHAUSTED` bodies become [`LlmError::QuotaExhausted`].
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    classify_status(provider, status.as_u16(), &body).into()
}

pub(crate) fn classify_status(provider: &str, status: u16, body: &str) -> LlmError {
    let message = format!("({status}) {}", sanitize_api_error(body));
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        LlmError::QuotaExhausted {
            provider: provider.to_string(),
            message,
        }
    } else {
        LlmError::Request {
            provider: provider.to_string(),
            message,
        }
    }
}
