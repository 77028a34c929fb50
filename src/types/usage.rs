//! Token usage reported by a finish frame.

use serde::{Deserialize, Serialize};

/// Token usage statistics. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            total_tokens: prompt_tokens.checked_add(completion_tokens),
        }
    }

    /// Reported total, or the sum of the parts when the producer omitted it.
    /// A sum that overflows `u64` is reported as unknown.
    pub fn total(&self) -> Option<u64> {
        self.total_tokens.or(match (self.prompt_tokens, self.completion_tokens) {
            (Some(p), Some(c)) => p.checked_add(c),
            _ => None,
        })
    }
}
