//! Anthropic (Claude) provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use parley_core::{ModelType, ProviderCredentials, ProviderError, TokenUsage, Vendor, VendorCatalog};

use crate::http::{post_json, trim_base_url};
use crate::tokenizer::TokenCounter;
use crate::traits::{GenerateOptions, Provider, VendorReply};

/// Anthropic API version.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic provider for Claude models.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    catalog: VendorCatalog,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
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

    fn parse_response(&self, response: AnthropicResponse) -> VendorReply {
        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContent::Text { text } => Some(text),
                AnthropicContent::Other => None,
            })
            .collect();

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens));

        VendorReply::new(text, usage)
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
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
        _model_type: ModelType,
        query: &str,
        options: &GenerateOptions,
    ) -> Result<VendorReply, ProviderError> {
        let api_request = AnthropicRequest {
            model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: query,
            }],
        };

        debug!("Sending request to Anthropic API");

        let request = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&api_request);

        let api_response: AnthropicResponse = post_json(request, self.id()).await?;
        Ok(self.parse_response(api_response))
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
