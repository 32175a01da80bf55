//! Configuration system for Parley.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::model::{ModelType, Vendor};

/// Main configuration struct for Parley.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation parameters sent with every request
    pub generation: GenerationConfig,
    /// Compare-all settings
    pub compare: CompareConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Model catalog source
    pub catalog: CatalogConfig,
    /// Provider configurations
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How compare-all issues its provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// One call at a time, in request order
    #[default]
    Sequential,
    /// All calls in flight together; results still in request order
    Concurrent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Dispatch mode: sequential, concurrent
    pub dispatch: DispatchMode,
    /// Vendors compared when none are given on the command line
    pub vendors: Vec<String>,
    /// Model types compared when none are given on the command line
    pub model_types: Vec<String>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::Sequential,
            vendors: Vendor::ALL.iter().map(|v| v.id().to_string()).collect(),
            model_types: vec![ModelType::Instruct.as_str().to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Replacement catalog file; the built-in catalog is used when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    /// OpenAI configuration
    pub openai: Option<ProviderConfig>,
    /// Anthropic configuration
    pub anthropic: Option<ProviderConfig>,
    /// Hugging Face configuration
    pub huggingface: Option<ProviderConfig>,
}

impl ProvidersConfig {
    pub fn get(&self, vendor: Vendor) -> Option<&ProviderConfig> {
        match vendor {
            Vendor::OpenAI => self.openai.as_ref(),
            Vendor::Anthropic => self.anthropic.as_ref(),
            Vendor::HuggingFace => self.huggingface.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key (can be set directly or via environment)
    pub api_key: Option<String>,
    /// Environment variable name for API key
    pub api_key_env: Option<String>,
    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Resolve the API key from either direct value or environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }
        if let Some(ref env_var) = self.api_key_env {
            if let Ok(key) = std::env::var(env_var) {
                return Some(key);
            }
        }
        None
    }
}

/// Resolved key and endpoint for one vendor. Read-only once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub base_url: String,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Credentials pointing at the vendor's public endpoint.
    pub fn with_default_url(vendor: Vendor, api_key: impl Into<String>) -> Self {
        Self::new(api_key, vendor.default_base_url())
    }
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Credentials for every vendor that has a usable key.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    entries: BTreeMap<Vendor, ProviderCredentials>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add credentials; blank keys are treated as absent.
    pub fn with(mut self, vendor: Vendor, credentials: ProviderCredentials) -> Self {
        self.insert(vendor, credentials);
        self
    }

    pub fn insert(&mut self, vendor: Vendor, credentials: ProviderCredentials) {
        if credentials.api_key.trim().is_empty() {
            return;
        }
        self.entries.insert(vendor, credentials);
    }

    pub fn get(&self, vendor: Vendor) -> Option<&ProviderCredentials> {
        self.entries.get(&vendor)
    }

    pub fn contains(&self, vendor: Vendor) -> bool {
        self.entries.contains_key(&vendor)
    }

    /// Vendors with credentials, in canonical order.
    pub fn vendors(&self) -> Vec<Vendor> {
        Vendor::ALL
            .iter()
            .copied()
            .filter(|v| self.contains(*v))
            .collect()
    }
}

/// Validation result with multiple issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .collect()
    }

    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .collect()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Field path (e.g., "generation.max_tokens")
    pub field: String,
    pub message: String,
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Warnings don't prevent loading
    Warning,
    /// Errors prevent loading
    Error,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Later sources win: defaults, user config, project config, the explicit
    /// file (if any), then `PARLEY_` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(Self::config_dir().join("config.toml")))
            .merge(Toml::file(".parley/config.toml"));

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("PARLEY_").split("__")).extract()
    }

    /// Load and validate configuration.
    pub fn load_validated(explicit: Option<&Path>) -> Result<Self, Error> {
        let config = Self::load(explicit).map_err(|e| Error::Config(e.to_string()))?;
        let result = config.validate();

        if !result.is_ok() {
            let errors: Vec<String> = result
                .errors()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(Error::Config(format!(
                "Configuration validation failed:\n  {}",
                errors.join("\n  ")
            )));
        }

        for warning in result.warnings() {
            tracing::warn!("Config warning - {}: {}", warning.field, warning.message);
        }

        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.generation.max_tokens == 0 {
            result.add_error("generation.max_tokens", "max_tokens must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            result.add_error(
                "generation.temperature",
                "temperature must be between 0.0 and 2.0",
            );
        }

        if self.generation.timeout_secs == 0 {
            result.add_error("generation.timeout_secs", "timeout_secs must be greater than 0");
        }

        for name in &self.compare.vendors {
            if name.parse::<Vendor>().is_err() {
                result.add_error("compare.vendors", format!("Unknown provider '{}'", name));
            }
        }

        for name in &self.compare.model_types {
            if name.parse::<ModelType>().is_err() {
                result.add_error("compare.model_types", format!("Unknown model type '{}'", name));
            }
        }

        for vendor in Vendor::ALL {
            let Some(provider) = self.providers.get(vendor) else {
                continue;
            };
            if provider.api_key.as_ref().map(|k| k.trim().is_empty()).unwrap_or(false) {
                result.add_warning(
                    format!("providers.{}.api_key", vendor),
                    "API key is empty string",
                );
            }
            if let Some(ref base_url) = provider.base_url {
                if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                    result.add_error(
                        format!("providers.{}.base_url", vendor),
                        "base_url must start with http:// or https://",
                    );
                }
            }
        }

        result
    }

    /// Resolve credentials for every vendor.
    ///
    /// Lookup order for the key: config `api_key`, the configured `api_key_env`,
    /// then the vendor's standard variable. Base URL: config, the vendor's
    /// `*_BASE_URL` variable, then the public endpoint.
    pub fn resolve_credentials(&self) -> CredentialSet {
        let mut set = CredentialSet::new();

        for vendor in Vendor::ALL {
            let provider = self.providers.get(vendor);
            let api_key = provider
                .and_then(|c| c.resolve_api_key())
                .filter(|k| !k.trim().is_empty())
                .or_else(|| std::env::var(vendor.api_key_env()).ok());

            let Some(api_key) = api_key else {
                continue;
            };

            let base_url = provider
                .and_then(|c| c.base_url.clone())
                .or_else(|| std::env::var(vendor.base_url_env()).ok())
                .unwrap_or_else(|| vendor.default_base_url().to_string());

            set.insert(vendor, ProviderCredentials::new(api_key, base_url));
        }

        set
    }

    /// Get the configuration directory.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("parley"))
            .unwrap_or_else(|| PathBuf::from("~/.config/parley"))
    }
}
