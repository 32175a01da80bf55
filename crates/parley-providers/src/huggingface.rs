//! Hugging Face Inference API provider implementation.
//!
//! The inference endpoint reports no token usage, so every successful
//! response carries estimated counts.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use parley_core::{ModelType, ProviderCredentials, ProviderError, Vendor, VendorCatalog};

use crate::http::{post_json, trim_base_url};
use crate::tokenizer::TokenCounter;
use crate::traits::{GenerateOptions, Provider, VendorReply};

/// Hugging Face provider for hosted open models.
pub struct HuggingFaceProvider {
    client: Client,
    api_key: String,
    base_url: String,
    catalog: VendorCatalog,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl HuggingFaceProvider {
    /// Create a new Hugging Face provider.
    pub fn new(credentials: ProviderCredentials, catalog: VendorCatalog) -> Self {
        Self {
            client: Client::new(),
            api_key: credentials.api_key,
            base_url: trim_base_url(&credentials.base_url),
            catalog,
            counter: None,
        }
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Chat-tuned models expect the conversation template around the query.
fn format_inputs(query: &str, model: &str, model_type: ModelType) -> String {
    let lower = model.to_lowercase();
    if model_type != ModelType::Base && (lower.contains("chat") || lower.contains("instruct")) {
        format!("<|user|>\n{}\n<|assistant|>\n", query)
    } else {
        query.to_string()
    }
}

/// Pull the generated text out of whatever shape the endpoint returned.
fn extract_text(value: Value) -> String {
    match value {
        Value::Array(items) if !items.is_empty() => match items.into_iter().next() {
            Some(Value::Object(map)) => match map.get("generated_text") {
                Some(Value::String(text)) => text.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            Some(other) => other.to_string(),
            None => String::new(),
        },
        Value::Object(map) => match map.get("generated_text") {
            Some(Value::String(text)) => text.clone(),
            _ => Value::Object(map).to_string(),
        },
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[async_trait]
impl Provider for HuggingFaceProvider {
    fn vendor(&self) -> Vendor {
        Vendor::HuggingFace
    }

    fn catalog(&self) -> &VendorCatalog {
        &self.catalog
    }

    fn token_counter(&self) -> Option<&dyn TokenCounter> {
        self.counter.as_deref()
    }

    #[instrument(skip(self, query, options), fields(model = %model))]
    async fn send(
        &self,
        model: &str,
        model_type: ModelType,
        query: &str,
        options: &GenerateOptions,
    ) -> Result<VendorReply, ProviderError> {
        let payload = InferenceRequest {
            inputs: format_inputs(query, model, model_type),
            parameters: InferenceParameters {
                max_new_tokens: options.max_tokens,
                temperature: options.temperature,
                return_full_text: false,
                do_sample: (model_type != ModelType::Base).then_some(true),
            },
        };

        debug!("Sending request to Hugging Face Inference API");

        let request = self
            .client
            .post(format!("{}/models/{}", self.base_url, model))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload);

        let body: Value = post_json(request, self.id()).await?;
        Ok(VendorReply::new(extract_text(body), None))
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    do_sample: Option<bool>,
}
