//! The normalized response record every provider produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ModelCharacteristics;
use crate::model::ModelType;

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input: u32,
    /// Generated tokens
    pub output: u32,
    /// Always `input + output`
    pub total: u32,
}

impl TokenUsage {
    pub fn new(input: u32, output: u32) -> Self {
        Self {
            input,
            output,
            total: input.saturating_add(output),
        }
    }

    /// Usage reported for a failed call.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Common result shape all vendor replies are converted into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResponse {
    /// Vendor identifier
    pub provider: String,
    /// Resolved concrete model identifier
    pub model_name: String,
    /// Requested category
    pub model_type: ModelType,
    /// Generated content, or an error description on failure
    pub text: String,
    /// Token counts, reported or estimated
    pub token_usage: TokenUsage,
    /// Wall-clock time of the single request
    pub response_time_seconds: f64,
    /// Maximum token capacity of the model
    pub context_window: u32,
    /// Descriptive metadata from the catalog
    pub characteristics: ModelCharacteristics,
    /// Present iff the request failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the record was produced
    pub timestamp: DateTime<Utc>,
}

impl NormalizedResponse {
    /// Whether the vendor call succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// First `max_chars` characters of the text, with an ellipsis if cut.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() > max_chars {
            let cut: String = self.text.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            self.text.clone()
        }
    }
}
