//! Provider registry: vendor lookup, credential gating and instance reuse.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use parley_core::{
    Config, CredentialSet, Error, ModelCatalog, ModelType, Result, Vendor,
};

use super::anthropic::AnthropicProvider;
use super::huggingface::HuggingFaceProvider;
use super::openai::OpenAIProvider;
use super::tokenizer::TokenEstimator;
use super::traits::Provider;

/// Registry of model providers.
///
/// Instances are built on first request and reused for the registry's
/// lifetime. A failed construction is not remembered, so a later call
/// retries it.
pub struct ProviderRegistry {
    credentials: CredentialSet,
    catalog: ModelCatalog,
    estimator: TokenEstimator,
    providers: Mutex<HashMap<Vendor, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    /// Create a registry over explicit credentials and catalog.
    pub fn new(credentials: CredentialSet, catalog: ModelCatalog) -> Self {
        Self {
            credentials,
            catalog,
            estimator: TokenEstimator::new(),
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Use `estimator` to pick per-vendor tokenizers for new providers.
    pub fn with_estimator(mut self, estimator: TokenEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Build a registry from configuration, resolving keys from config and environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = ModelCatalog::load(config.catalog.path.as_deref())?;
        let credentials = config.resolve_credentials();
        debug!(
            vendors = ?credentials.vendors(),
            "Resolved provider credentials"
        );
        Ok(Self::new(credentials, catalog).with_estimator(TokenEstimator::platform_default()))
    }

    /// Get a provider by vendor name (case-insensitive).
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>> {
        let vendor: Vendor = name.parse()?;
        self.get_vendor(vendor)
    }

    /// Get the provider for a vendor, constructing it on first use.
    pub fn get_vendor(&self, vendor: Vendor) -> Result<Arc<dyn Provider>> {
        let mut providers = self.providers.lock();
        if let Some(provider) = providers.get(&vendor) {
            return Ok(provider.clone());
        }

        let provider = self.build(vendor)?;
        debug!(provider = vendor.id(), "Provider initialized");
        providers.insert(vendor, provider.clone());
        Ok(provider)
    }

    fn build(&self, vendor: Vendor) -> Result<Arc<dyn Provider>> {
        let credentials = self
            .credentials
            .get(vendor)
            .cloned()
            .ok_or_else(|| Error::credential_missing(vendor))?;
        let catalog = self.catalog.vendor(vendor)?.clone();
        let counter = self.estimator.counter_for(vendor);

        let provider: Arc<dyn Provider> = match vendor {
            Vendor::OpenAI => {
                let mut p = OpenAIProvider::new(credentials, catalog);
                if let Some(c) = counter {
                    p = p.with_token_counter(c);
                }
                Arc::new(p)
            }
            Vendor::Anthropic => {
                let mut p = AnthropicProvider::new(credentials, catalog);
                if let Some(c) = counter {
                    p = p.with_token_counter(c);
                }
                Arc::new(p)
            }
            Vendor::HuggingFace => {
                let mut p = HuggingFaceProvider::new(credentials, catalog);
                if let Some(c) = counter {
                    p = p.with_token_counter(c);
                }
                Arc::new(p)
            }
        };
        Ok(provider)
    }

    /// Pre-seed a provider instance, replacing any cached one for its vendor.
    pub fn register(&self, provider: Arc<dyn Provider>) {
        self.providers.lock().insert(provider.vendor(), provider);
    }

    /// Whether an instance for `vendor` has been built or registered.
    pub fn is_cached(&self, vendor: Vendor) -> bool {
        self.providers.lock().contains_key(&vendor)
    }

    /// Vendors that can be used, in canonical order. Makes no network calls.
    pub fn list_available(&self) -> Vec<&'static str> {
        let providers = self.providers.lock();
        Vendor::ALL
            .iter()
            .filter(|v| self.credentials.contains(**v) || providers.contains_key(*v))
            .map(|v| v.id())
            .collect()
    }

    /// Model lists for every available vendor.
    pub fn all_available_models(&self) -> BTreeMap<String, BTreeMap<ModelType, Vec<String>>> {
        self.list_available()
            .into_iter()
            .filter_map(|id| {
                self.get(id)
                    .ok()
                    .map(|p| (id.to_string(), p.available_models()))
            })
            .collect()
    }

    /// The catalog providers are built from.
    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// The token estimator shared with providers.
    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("available", &self.list_available())
            .finish()
    }
}
