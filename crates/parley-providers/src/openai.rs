//! OpenAI (GPT) provider implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use parley_core::{ModelType, ProviderCredentials, ProviderError, TokenUsage, Vendor, VendorCatalog};

use crate::http::{post_json, trim_base_url};
use crate::tokenizer::TokenCounter;
use crate::traits::{GenerateOptions, Provider, VendorReply};

/// OpenAI provider for GPT models.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    catalog: VendorCatalog,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider.
    pub fn new(credentials: ProviderCredentials, catalog: VendorCatalog) -> Self {
        Self {
            client: Client::new(),
            api_key: credentials.api_key,
            base_url: trim_base_url(&credentials.base_url),
            catalog,
            counter: None,
        }
    }

    /// Use a precise tokenizer for usage estimates.
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn parse_response(&self, response: OpenAIResponse) -> Result<VendorReply, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::invalid_response(self.id(), "response has no choices"))?;

        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));

        Ok(VendorReply::new(
            choice.message.content.unwrap_or_default(),
            usage,
        ))
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAI
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
        let api_request = OpenAIRequest {
            model,
            messages: vec![OpenAIMessage {
                role: "user",
                content: query,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        debug!("Sending request to OpenAI API");

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&api_request);

        let api_response: OpenAIResponse = post_json(request, self.id()).await?;
        self.parse_response(api_response)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIReplyMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::ModelCatalog;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> OpenAIProvider {
        let catalog = ModelCatalog::builtin().unwrap();
        OpenAIProvider::new(
            ProviderCredentials::new("test-key", base_url),
            catalog.vendor(Vendor::OpenAI).unwrap().clone(),
        )
    }

    #[test]
    fn test_provider_metadata() {
        let provider = provider("https://api.openai.com/v1/");
        assert_eq!(provider.id(), "openai");
        assert_eq!(provider.display_name(), "OpenAI");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
        assert!(provider.available_models()[&ModelType::Instruct].contains(&"gpt-4o".to_string()));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Say hi"}],
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let r = provider(&server.uri())
            .generate("Say hi", ModelType::Instruct, None, &GenerateOptions::default())
            .await
            .unwrap();

        assert!(r.is_success());
        assert_eq!(r.model_name, "gpt-3.5-turbo");
        assert_eq!(r.text, "Hi!");
        assert_eq!(r.token_usage, TokenUsage::new(9, 2));
        assert_eq!(r.context_window, 4096);
    }

    #[tokio::test]
    async fn test_http_error_is_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let r = provider(&server.uri())
            .generate("Say hi", ModelType::Instruct, Some("gpt-4"), &GenerateOptions::default())
            .await
            .unwrap();

        assert!(!r.is_success());
        assert_eq!(r.model_name, "gpt-4");
        assert_eq!(r.token_usage, TokenUsage::zero());
        assert!(r.text.starts_with("Error: "));
        assert!(r.error.unwrap().contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let r = provider(&server.uri())
            .generate("Say hi", ModelType::Base, None, &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(r.model_name, "gpt-3.5-turbo-instruct");
        assert!(r.error.unwrap().contains("Invalid response"));
    }

    #[tokio::test]
    async fn test_timeout_is_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let options = GenerateOptions {
            timeout: Duration::from_millis(100),
            ..GenerateOptions::default()
        };
        let r = provider(&server.uri())
            .generate("Say hi", ModelType::Instruct, None, &options)
            .await
            .unwrap();

        assert!(r.error.unwrap().contains("timed out after 0.1s"));
        assert!(r.response_time_seconds < 5.0);
    }
}
