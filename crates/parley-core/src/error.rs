//! Error types for Parley.
//!
//! Configuration-level mistakes surface as [`Error`] and propagate to the caller.
//! Failures of a single vendor call are [`ProviderError`]s; they are captured into
//! a normalized response instead of being returned.

use thiserror::Error;

use crate::model::{ModelType, Vendor};

/// Result type alias using Parley's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Parley.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider constructed without the credentials it needs
    #[error("Credentials for provider '{vendor}' are missing")]
    CredentialMissing {
        vendor: Vendor,
        env_var: Option<String>,
    },

    /// Vendor name that Parley does not know how to talk to
    #[error("Unsupported provider: {0}")]
    UnsupportedVendor(String),

    /// No explicit model name and no catalog default for the requested type
    #[error("No available {model_type} model for provider '{vendor}'")]
    NoModelAvailable {
        vendor: Vendor,
        model_type: ModelType,
    },

    /// Unknown model type string
    #[error("Invalid model type '{0}' (expected base, instruct or fine-tuned)")]
    InvalidModelType(String),

    /// Model catalog could not be loaded
    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl Error {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Config(_) => Some("Check your config file at ~/.config/parley/config.toml"),
            Error::CredentialMissing { env_var: Some(_), .. } => {
                Some("Set the API key environment variable or add it under [providers.<name>]")
            }
            Error::CredentialMissing { .. } => {
                Some("Add an api_key under [providers.<name>] in your config")
            }
            Error::UnsupportedVendor(_) => Some("Supported providers: openai, anthropic, huggingface"),
            Error::NoModelAvailable { .. } => {
                Some("Pass an explicit model with --model or pick another model type")
            }
            Error::InvalidModelType(_) => Some("Use one of: base, instruct, fine-tuned"),
            Error::Catalog(_) => Some("Check the file configured under [catalog] path"),
        }
    }

    /// Create a credential-missing error for a vendor.
    pub fn credential_missing(vendor: Vendor) -> Self {
        Error::CredentialMissing {
            vendor,
            env_var: Some(vendor.api_key_env().to_string()),
        }
    }
}

/// Failure of a single vendor call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Authentication failed
    #[error("Authentication failed for {provider}: {message}")]
    AuthenticationFailed { provider: String, message: String },

    /// API request failed
    #[error("API request to {provider} failed: {status} - {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Timeout
    #[error("Request to {provider} timed out after {}s", millis_to_secs(.millis))]
    Timeout { provider: String, millis: u64 },

    /// Network error
    #[error("Network error connecting to {provider}: {message}")]
    NetworkError { provider: String, message: String },

    /// Response body did not match the expected shape
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            ProviderError::AuthenticationFailed { .. } => {
                Some("Check that your API key is valid and not expired")
            }
            ProviderError::ApiError { status: 429, .. } => {
                Some("You've hit rate limits. Wait a moment and try again")
            }
            ProviderError::ApiError {
                status: 500..=599, ..
            } => Some("The API service is having issues. Try again later"),
            ProviderError::Timeout { .. } => {
                Some("Raise --timeout or check your network connection")
            }
            ProviderError::NetworkError { .. } => Some("Check your internet connection"),
            _ => None,
        }
    }

    /// Map an HTTP status and body to the matching error.
    pub fn from_status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        match status {
            401 | 403 => ProviderError::AuthenticationFailed { provider, message },
            _ => ProviderError::ApiError {
                provider,
                status,
                message,
            },
        }
    }

    /// Classify a transport error from the HTTP client.
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::NetworkError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// A reply that could not be decoded.
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

fn millis_to_secs(millis: &u64) -> f64 {
    *millis as f64 / 1000.0
}

/// Format an error with its recovery suggestion.
pub fn format_error_with_suggestion(error: &Error) -> String {
    let mut output = error.to_string();
    if let Some(suggestion) = error.recovery_suggestion() {
        output.push_str(&format!("\n  Suggestion: {}", suggestion));
    }
    output
}
