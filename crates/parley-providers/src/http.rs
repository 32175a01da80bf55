//! Shared request plumbing for the HTTP-backed providers.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::error;

use parley_core::ProviderError;

/// Send a prepared request and decode a JSON reply.
///
/// Transport failures become `NetworkError`, non-2xx statuses go through
/// [`ProviderError::from_status`] and undecodable bodies become `InvalidResponse`.
pub(crate) async fn post_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::network(provider, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("{} API error: {} - {}", provider, status, error_text);
        return Err(ProviderError::from_status(
            provider,
            status.as_u16(),
            error_text,
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(provider, e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| ProviderError::invalid_response(provider, e.to_string()))
}

/// Strip trailing slashes so paths can be appended with `format!`.
pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
