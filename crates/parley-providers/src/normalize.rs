//! Conversion of vendor replies and failures into [`NormalizedResponse`].

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use parley_core::{ModelType, NormalizedResponse, ProviderError, TokenUsage, VendorCatalog};

use crate::tokenizer::{heuristic_tokens, TokenCounter};
use crate::traits::{Provider, VendorReply};

/// Builds normalized responses for one provider.
pub struct ResponseNormalizer<'a> {
    provider: &'a str,
    catalog: &'a VendorCatalog,
    counter: Option<&'a dyn TokenCounter>,
}

impl<'a> ResponseNormalizer<'a> {
    pub fn new(provider: &'a str, catalog: &'a VendorCatalog) -> Self {
        Self {
            provider,
            catalog,
            counter: None,
        }
    }

    /// Use a precise counter when the vendor reports no usage.
    pub fn with_counter(mut self, counter: Option<&'a dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Normalizer bound to a provider's id, catalog and tokenizer.
    pub fn for_provider<P: Provider + ?Sized>(provider: &'a P) -> Self {
        Self::new(provider.id(), provider.catalog()).with_counter(provider.token_counter())
    }

    fn estimate(&self, text: &str, model: &str) -> u32 {
        let tokens = match self.counter {
            Some(counter) => counter.count(text, Some(model)),
            None => heuristic_tokens(text),
        };
        u32::try_from(tokens).unwrap_or(u32::MAX)
    }

    /// Record for a successful call. Missing usage is estimated from the query and reply.
    pub fn success(
        &self,
        model: &str,
        model_type: ModelType,
        query: &str,
        reply: VendorReply,
        elapsed: Duration,
    ) -> NormalizedResponse {
        let token_usage = match reply.usage {
            Some(usage) => TokenUsage::new(usage.input, usage.output),
            None => {
                debug!(provider = self.provider, model, "No usage reported, estimating tokens");
                TokenUsage::new(self.estimate(query, model), self.estimate(&reply.text, model))
            }
        };

        self.record(model, model_type, reply.text, token_usage, elapsed, None)
    }

    /// Record for a failed call: zero usage and the error in both `text` and `error`.
    pub fn failure(
        &self,
        model: &str,
        model_type: ModelType,
        error: &ProviderError,
        elapsed: Duration,
    ) -> NormalizedResponse {
        let message = error.to_string();
        self.record(
            model,
            model_type,
            format!("Error: {}", message),
            TokenUsage::zero(),
            elapsed,
            Some(message),
        )
    }

    pub fn normalize(
        &self,
        model: &str,
        model_type: ModelType,
        query: &str,
        outcome: Result<VendorReply, ProviderError>,
        elapsed: Duration,
    ) -> NormalizedResponse {
        match outcome {
            Ok(reply) => self.success(model, model_type, query, reply, elapsed),
            Err(e) => self.failure(model, model_type, &e, elapsed),
        }
    }

    fn record(
        &self,
        model: &str,
        model_type: ModelType,
        text: String,
        token_usage: TokenUsage,
        elapsed: Duration,
        error: Option<String>,
    ) -> NormalizedResponse {
        NormalizedResponse {
            provider: self.provider.to_string(),
            model_name: model.to_string(),
            model_type,
            text,
            token_usage,
            response_time_seconds: elapsed.as_secs_f64(),
            context_window: self.catalog.context_window(model),
            characteristics: self.catalog.characteristics(model),
            error,
            timestamp: Utc::now(),
        }
    }
}
