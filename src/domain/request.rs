//! Inbound trigger message and the topic classifier that gates it.

use serde::{Deserialize, Serialize};

/// Keyword pairs; a request matches when both words of any pair occur.
const TRIGGER_KEYWORDS: [(&str, &str); 3] = [
    ("deploy", "character"),
    ("create", "character"),
    ("spawn", "agent"),
];

/// Returns true when `text` asks for a character deployment.
///
/// Matching is case-insensitive substring search, so "Deploying" and
/// "characters" count.
pub fn accepts(text: &str) -> bool {
    let content = text.to_lowercase();
    let matched = TRIGGER_KEYWORDS
        .iter()
        .any(|(first, second)| content.contains(first) && content.contains(second));
    tracing::debug!(matched, "Validated message for character deployment");
    matched
}

/// A natural-language deployment request, consumed once by the extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    raw_text: String,
}

impl DeploymentRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }
}
