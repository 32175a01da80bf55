//! Vendor and model selection primitives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A supported model vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAI,
    /// Anthropic messages API
    Anthropic,
    /// Hugging Face Inference API
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl Vendor {
    /// All vendors in canonical order.
    pub const ALL: [Vendor; 3] = [Vendor::OpenAI, Vendor::Anthropic, Vendor::HuggingFace];

    /// Stable identifier used in config, CLI arguments and responses.
    pub fn id(&self) -> &'static str {
        match self {
            Vendor::OpenAI => "openai",
            Vendor::Anthropic => "anthropic",
            Vendor::HuggingFace => "huggingface",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Vendor::OpenAI => "OpenAI",
            Vendor::Anthropic => "Anthropic",
            Vendor::HuggingFace => "Hugging Face",
        }
    }

    /// Environment variable consulted for the API key when config has none.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Vendor::OpenAI => "OPENAI_API_KEY",
            Vendor::Anthropic => "ANTHROPIC_API_KEY",
            Vendor::HuggingFace => "HUGGINGFACE_API_KEY",
        }
    }

    /// Environment variable consulted for a base URL override.
    pub fn base_url_env(&self) -> &'static str {
        match self {
            Vendor::OpenAI => "OPENAI_BASE_URL",
            Vendor::Anthropic => "ANTHROPIC_BASE_URL",
            Vendor::HuggingFace => "HUGGINGFACE_BASE_URL",
        }
    }

    /// Public endpoint used when nothing overrides it.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Vendor::OpenAI => "https://api.openai.com/v1",
            Vendor::Anthropic => "https://api.anthropic.com/v1",
            Vendor::HuggingFace => "https://api-inference.huggingface.co",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Vendor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Vendor::OpenAI),
            "anthropic" => Ok(Vendor::Anthropic),
            "huggingface" | "hf" => Ok(Vendor::HuggingFace),
            other => Err(Error::UnsupportedVendor(other.to_string())),
        }
    }
}

/// Coarse model category used to pick a default model per vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelType {
    /// Pretrained model without instruction tuning
    #[serde(rename = "base")]
    Base,
    /// Instruction or chat tuned model
    #[serde(rename = "instruct")]
    Instruct,
    /// Task-specific fine-tune
    #[serde(rename = "fine-tuned")]
    FineTuned,
}

impl ModelType {
    /// All model types in canonical order.
    pub const ALL: [ModelType; 3] = [ModelType::Base, ModelType::Instruct, ModelType::FineTuned];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Base => "base",
            ModelType::Instruct => "instruct",
            ModelType::FineTuned => "fine-tuned",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::Instruct
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base" => Ok(ModelType::Base),
            "instruct" => Ok(ModelType::Instruct),
            "fine-tuned" | "fine_tuned" | "finetuned" => Ok(ModelType::FineTuned),
            other => Err(Error::InvalidModelType(other.to_string())),
        }
    }
}

/// A request for one concrete model.
///
/// An explicit `model_name` always wins over the type-based default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    pub vendor: Vendor,
    pub model_type: ModelType,
    pub model_name: Option<String>,
}

impl ModelSelector {
    pub fn new(vendor: Vendor, model_type: ModelType) -> Self {
        Self {
            vendor,
            model_type,
            model_name: None,
        }
    }

    /// Pin an explicit model name.
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }
}
