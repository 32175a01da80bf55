//! End-to-end comparison runs against mock vendor endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_compare::Orchestrator;
use parley_core::{
    CredentialSet, DispatchMode, Error, ModelCatalog, ModelSelector, ModelType, ProviderCredentials,
    Vendor,
};
use parley_providers::ProviderRegistry;

fn openai_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 3, "completion_tokens": 1}
    }))
}

async fn mount_openai(server: &MockServer, model: &str, text: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": model })))
        .respond_with(openai_reply(text).set_delay(delay))
        .mount(server)
        .await;
}

async fn mount_huggingface(server: &MockServer, model: &str, text: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/models/{}", model)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": text }])))
        .mount(server)
        .await;
}

fn orchestrator(credentials: CredentialSet) -> Orchestrator {
    let registry = ProviderRegistry::new(credentials, ModelCatalog::builtin().unwrap());
    Orchestrator::new(Arc::new(registry))
}

async fn two_vendor_setup(openai_base_delay: Duration) -> (MockServer, MockServer, Orchestrator) {
    let openai = MockServer::start().await;
    mount_openai(&openai, "gpt-3.5-turbo-instruct", "openai base", openai_base_delay).await;
    mount_openai(&openai, "gpt-3.5-turbo", "openai instruct", Duration::ZERO).await;

    let hf = MockServer::start().await;
    mount_huggingface(&hf, "meta-llama/Llama-2-7b-hf", "hf base").await;
    mount_huggingface(&hf, "meta-llama/Llama-2-7b-chat-hf", "hf instruct").await;

    let credentials = CredentialSet::new()
        .with(Vendor::OpenAI, ProviderCredentials::new("sk-test", openai.uri()))
        .with(Vendor::HuggingFace, ProviderCredentials::new("hf_test", hf.uri()));

    (openai, hf, orchestrator(credentials))
}

fn summary(batch: &parley_compare::ComparisonBatch) -> Vec<(String, ModelType, String, String)> {
    batch
        .responses
        .iter()
        .map(|r| {
            (
                r.provider.clone(),
                r.model_type,
                r.model_name.clone(),
                r.text.clone(),
            )
        })
        .collect()
}

fn expected_order() -> Vec<(String, ModelType, String, String)> {
    vec![
        (
            "openai".into(),
            ModelType::Base,
            "gpt-3.5-turbo-instruct".into(),
            "openai base".into(),
        ),
        (
            "openai".into(),
            ModelType::Instruct,
            "gpt-3.5-turbo".into(),
            "openai instruct".into(),
        ),
        (
            "huggingface".into(),
            ModelType::Base,
            "meta-llama/Llama-2-7b-hf".into(),
            "hf base".into(),
        ),
        (
            "huggingface".into(),
            ModelType::Instruct,
            "meta-llama/Llama-2-7b-chat-hf".into(),
            "hf instruct".into(),
        ),
    ]
}

#[tokio::test]
async fn test_compare_all_is_vendor_major() {
    let (_openai, _hf, orchestrator) = two_vendor_setup(Duration::ZERO).await;

    let batch = orchestrator
        .compare_all(
            "Tell me a story",
            &["openai", "huggingface"],
            &[ModelType::Base, ModelType::Instruct],
        )
        .await
        .unwrap();

    assert_eq!(summary(&batch), expected_order());
    assert!(batch.warnings.is_empty());
    assert_eq!(batch.successful(), 4);
}

#[tokio::test]
async fn test_concurrent_dispatch_keeps_request_order() {
    // The first pair answers last
    let (_openai, _hf, orchestrator) = two_vendor_setup(Duration::from_millis(300)).await;
    let orchestrator = orchestrator.with_dispatch(DispatchMode::Concurrent);

    let batch = orchestrator
        .compare_all(
            "Tell me a story",
            &["openai", "huggingface"],
            &[ModelType::Base, ModelType::Instruct],
        )
        .await
        .unwrap();

    assert_eq!(summary(&batch), expected_order());
}

#[tokio::test]
async fn test_missing_vendor_is_skipped_with_warning() {
    let openai = MockServer::start().await;
    mount_openai(&openai, "gpt-3.5-turbo", "only openai", Duration::ZERO).await;

    let credentials =
        CredentialSet::new().with(Vendor::OpenAI, ProviderCredentials::new("sk-test", openai.uri()));
    let orchestrator = orchestrator(credentials);

    let batch = orchestrator
        .compare_all("hi", &["openai", "anthropic"], &[ModelType::Instruct])
        .await
        .unwrap();

    assert_eq!(batch.responses.len(), 1);
    assert_eq!(batch.responses[0].provider, "openai");
    assert!(batch.responses.iter().all(|r| r.is_success()));
    assert_eq!(batch.warnings.len(), 1);
    assert!(batch.warnings[0].contains("anthropic"));
}

#[tokio::test]
async fn test_vendor_failure_stays_in_batch() {
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&openai)
        .await;

    let credentials =
        CredentialSet::new().with(Vendor::OpenAI, ProviderCredentials::new("sk-test", openai.uri()));
    let batch = orchestrator(credentials)
        .compare_all("hi", &["openai"], &[ModelType::Base, ModelType::Instruct])
        .await
        .unwrap();

    assert_eq!(batch.responses.len(), 2);
    assert_eq!(batch.successful(), 0);
    for r in &batch.responses {
        assert!(r.error.as_deref().unwrap().contains("429"));
        assert_eq!(r.token_usage.total, 0);
    }
}

#[tokio::test]
async fn test_query_single_success() {
    let openai = MockServer::start().await;
    mount_openai(&openai, "gpt-3.5-turbo", "Y", Duration::ZERO).await;

    let credentials =
        CredentialSet::new().with(Vendor::OpenAI, ProviderCredentials::new("sk-test", openai.uri()));
    let response = orchestrator(credentials)
        .query_single("Explain X", "openai", ModelType::Instruct, None)
        .await
        .unwrap();

    assert_eq!(response.provider, "openai");
    assert_eq!(response.text, "Y");
    assert!(response.error.is_none());
    assert_eq!(response.model_name, "gpt-3.5-turbo");
}

#[tokio::test]
async fn test_query_single_missing_credentials_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let credentials =
        CredentialSet::new().with(Vendor::OpenAI, ProviderCredentials::new("sk-test", server.uri()));
    let err = orchestrator(credentials)
        .query_single("Explain X", "anthropic", ModelType::Instruct, None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::CredentialMissing {
            vendor: Vendor::Anthropic,
            ..
        }
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_selector_explicit_model_overrides_default() {
    let openai = MockServer::start().await;
    mount_openai(&openai, "gpt-4", "from gpt-4", Duration::ZERO).await;

    let credentials =
        CredentialSet::new().with(Vendor::OpenAI, ProviderCredentials::new("sk-test", openai.uri()));
    let selector = ModelSelector::new(Vendor::OpenAI, ModelType::Base).with_model("gpt-4");
    let response = orchestrator(credentials)
        .query("hi", &selector)
        .await
        .unwrap();

    assert_eq!(response.model_name, "gpt-4");
    assert_eq!(response.model_type, ModelType::Base);
    assert_eq!(response.text, "from gpt-4");
    assert_eq!(response.context_window, 8192);
}
