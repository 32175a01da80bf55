//! Provider trait definitions.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use parley_core::config::GenerationConfig;
use parley_core::{
    Error, ModelCharacteristics, ModelType, NormalizedResponse, ProviderError, Result,
    TokenUsage, Vendor, VendorCatalog,
};

use crate::normalize::ResponseNormalizer;
use crate::tokenizer::{heuristic_tokens, TokenCounter};

/// Generation settings applied to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,
    /// Upper bound on the whole vendor round-trip
    pub timeout: Duration,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&GenerationConfig> for GenerateOptions {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }
}

/// What a vendor returned before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorReply {
    /// Generated text
    pub text: String,
    /// Usage as reported by the vendor, if it reports any
    pub usage: Option<TokenUsage>,
}

impl VendorReply {
    pub fn new(text: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Core provider trait - every model vendor implements this.
///
/// Implementors supply the vendor wire call ([`Provider::send`]) and their
/// catalog. Model resolution, timing, timeouts and normalization are shared
/// through the provided [`Provider::generate`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Which vendor this is.
    fn vendor(&self) -> Vendor;

    /// Human-readable name.
    fn display_name(&self) -> &str {
        self.vendor().display_name()
    }

    /// Provider identifier, as it appears in normalized responses.
    fn id(&self) -> &str {
        self.vendor().id()
    }

    /// Catalog data this provider was constructed with.
    fn catalog(&self) -> &VendorCatalog;

    /// Precise tokenizer for this vendor, if one was injected.
    fn token_counter(&self) -> Option<&dyn TokenCounter> {
        None
    }

    /// Issue one request to the vendor.
    async fn send(
        &self,
        model: &str,
        model_type: ModelType,
        query: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<VendorReply, ProviderError>;

    /// Known model names keyed by type.
    fn available_models(&self) -> BTreeMap<ModelType, Vec<String>> {
        self.catalog().available_models()
    }

    /// Catalog characteristics for a model.
    fn characteristics(&self, model_name: &str) -> ModelCharacteristics {
        self.catalog().characteristics(model_name)
    }

    /// Context window for a model.
    fn context_window(&self, model_name: &str) -> u32 {
        self.catalog().context_window(model_name)
    }

    /// Estimate tokens with the injected counter or the word heuristic.
    fn estimate_tokens(&self, text: &str, model: Option<&str>) -> usize {
        match self.token_counter() {
            Some(counter) => counter.count(text, model),
            None => heuristic_tokens(text),
        }
    }

    /// Pick the concrete model: the explicit name, else the catalog default.
    fn resolve_model(&self, model_type: ModelType, model_name: Option<&str>) -> Result<String> {
        if let Some(name) = model_name.filter(|n| !n.trim().is_empty()) {
            return Ok(name.to_string());
        }
        self.catalog()
            .default_model(model_type)
            .map(str::to_string)
            .ok_or(Error::NoModelAvailable {
                vendor: self.vendor(),
                model_type,
            })
    }

    /// Generate a normalized response for `query`.
    ///
    /// Only model resolution can fail. Vendor failures, including timeouts,
    /// come back as a response with `error` set and zero usage.
    async fn generate(
        &self,
        query: &str,
        model_type: ModelType,
        model_name: Option<&str>,
        options: &GenerateOptions,
    ) -> Result<NormalizedResponse> {
        let model = self.resolve_model(model_type, model_name)?;
        debug!(provider = self.id(), model = %model, "Sending request");

        let started = Instant::now();
        let outcome =
            match tokio::time::timeout(options.timeout, self.send(&model, model_type, query, options))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout {
                    provider: self.id().to_string(),
                    millis: options.timeout.as_millis() as u64,
                }),
            };
        let elapsed = started.elapsed();

        if let Err(e) = &outcome {
            warn!(provider = self.id(), model = %model, "Request failed: {}", e);
        }

        Ok(ResponseNormalizer::for_provider(self).normalize(
            &model, model_type, query, outcome, elapsed,
        ))
    }
}
