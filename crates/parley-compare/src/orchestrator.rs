//! Fan-out of one query across (vendor, model type) pairs.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use parley_core::{Config, DispatchMode, ModelSelector, ModelType, NormalizedResponse, Result};
use parley_providers::{GenerateOptions, Provider, ProviderRegistry};

/// Responses from one comparison run, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonBatch {
    pub responses: Vec<NormalizedResponse>,
    /// Vendors that were skipped, with the reason
    pub warnings: Vec<String>,
    pub total_time_seconds: f64,
}

impl ComparisonBatch {
    /// Number of responses without an error.
    pub fn successful(&self) -> usize {
        self.responses.iter().filter(|r| r.is_success()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

/// One resolved (vendor, type, model) triple, ready to send.
struct PlannedCall {
    provider: Arc<dyn Provider>,
    model_type: ModelType,
    model: String,
}

/// Runs queries against one or many providers.
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    options: GenerateOptions,
    dispatch: DispatchMode,
}

impl Orchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            options: GenerateOptions::default(),
            dispatch: DispatchMode::default(),
        }
    }

    /// Build the registry, generation options and dispatch mode from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(config)?;
        Ok(Self::new(Arc::new(registry))
            .with_options(GenerateOptions::from(&config.generation))
            .with_dispatch(config.compare.dispatch))
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_dispatch(mut self, dispatch: DispatchMode) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn dispatch(&self) -> DispatchMode {
        self.dispatch
    }

    /// Query one vendor with one model type.
    ///
    /// Unknown vendors, missing credentials and unresolvable models are
    /// returned as errors without touching the network. Vendor call failures
    /// come back inside the response.
    pub async fn query_single(
        &self,
        query: &str,
        vendor: &str,
        model_type: ModelType,
        model_name: Option<&str>,
    ) -> Result<NormalizedResponse> {
        let mut selector = ModelSelector::new(vendor.parse()?, model_type);
        if let Some(name) = model_name {
            selector = selector.with_model(name);
        }
        self.query(query, &selector).await
    }

    /// Query the model a selector points at.
    pub async fn query(&self, query: &str, selector: &ModelSelector) -> Result<NormalizedResponse> {
        let provider = self.registry.get_vendor(selector.vendor)?;
        let response = provider
            .generate(
                query,
                selector.model_type,
                selector.model_name.as_deref(),
                &self.options,
            )
            .await?;

        info!(
            provider = %response.provider,
            model = %response.model_name,
            success = response.is_success(),
            "Query complete in {:.2}s",
            response.response_time_seconds
        );
        Ok(response)
    }

    /// Query every (vendor, model type) pair, vendor-major.
    ///
    /// A vendor the registry cannot provide is skipped with a warning. A
    /// pair with no model to run is an error, reported before any request
    /// is sent.
    pub async fn compare_all<S: AsRef<str>>(
        &self,
        query: &str,
        vendors: &[S],
        model_types: &[ModelType],
    ) -> Result<ComparisonBatch> {
        let vendor_names: Vec<&str> = vendors.iter().map(AsRef::as_ref).collect();
        info!(
            query = %truncate_for_log(query),
            providers = ?vendor_names,
            model_types = ?model_types,
            "Comparison started"
        );

        let started = Instant::now();
        let (plan, warnings) = self.plan(&vendor_names, model_types)?;

        let responses = match self.dispatch {
            DispatchMode::Sequential => {
                let mut responses = Vec::with_capacity(plan.len());
                for call in &plan {
                    responses.push(self.run(query, call).await?);
                }
                responses
            }
            DispatchMode::Concurrent => {
                debug!(count = plan.len(), "Dispatching pairs concurrently");
                let futures: Vec<_> = plan.iter().map(|call| self.run(query, call)).collect();
                join_all(futures)
                    .await
                    .into_iter()
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let batch = ComparisonBatch {
            responses,
            warnings,
            total_time_seconds: started.elapsed().as_secs_f64(),
        };

        info!(
            total = batch.responses.len(),
            successful = batch.successful(),
            "Comparison complete in {:.2}s",
            batch.total_time_seconds
        );
        Ok(batch)
    }

    /// Resolve every pair up front so model errors surface before dispatch.
    fn plan(
        &self,
        vendors: &[&str],
        model_types: &[ModelType],
    ) -> Result<(Vec<PlannedCall>, Vec<String>)> {
        let mut plan = Vec::with_capacity(vendors.len() * model_types.len());
        let mut warnings = Vec::new();

        for vendor in vendors {
            let provider = match self.registry.get(vendor) {
                Ok(p) => p,
                Err(e) => {
                    warn!(provider = %vendor, "Skipping provider: {}", e);
                    warnings.push(format!("Skipping {}: {}", vendor, e));
                    continue;
                }
            };

            for model_type in model_types {
                let model = provider.resolve_model(*model_type, None)?;
                plan.push(PlannedCall {
                    provider: provider.clone(),
                    model_type: *model_type,
                    model,
                });
            }
        }

        Ok((plan, warnings))
    }

    async fn run(&self, query: &str, call: &PlannedCall) -> Result<NormalizedResponse> {
        call.provider
            .generate(query, call.model_type, Some(&call.model), &self.options)
            .await
    }
}

fn truncate_for_log(query: &str) -> String {
    if query.chars().count() > 50 {
        format!("{}...", query.chars().take(50).collect::<String>())
    } else {
        query.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{CredentialSet, Error, ModelCatalog, ProviderCredentials, Vendor};

    fn orchestrator(vendors: &[Vendor]) -> Orchestrator {
        let mut credentials = CredentialSet::new();
        for v in vendors {
            // Never contacted: every case here fails or skips before dispatch
            credentials.insert(*v, ProviderCredentials::new("key", "http://127.0.0.1:9"));
        }
        let registry = ProviderRegistry::new(credentials, ModelCatalog::builtin().unwrap());
        Orchestrator::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_compare_with_no_credentials_is_empty() {
        let orchestrator = orchestrator(&[]);
        let batch = orchestrator
            .compare_all("hi", &["openai", "anthropic"], &[ModelType::Instruct])
            .await
            .unwrap();

        assert!(batch.is_empty());
        assert_eq!(batch.warnings.len(), 2);
        assert!(batch.warnings[0].contains("openai"));
    }

    #[tokio::test]
    async fn test_unknown_vendor_is_skipped_in_compare() {
        let orchestrator = orchestrator(&[]);
        let batch = orchestrator
            .compare_all("hi", &["cohere"], &[ModelType::Instruct])
            .await
            .unwrap();

        assert!(batch.is_empty());
        assert!(batch.warnings[0].contains("Unsupported provider"));
    }

    #[tokio::test]
    async fn test_no_model_available_propagates_before_dispatch() {
        let orchestrator = orchestrator(&[Vendor::Anthropic]);
        let err = orchestrator
            .compare_all("hi", &["anthropic"], &[ModelType::Instruct, ModelType::Base])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::NoModelAvailable {
                vendor: Vendor::Anthropic,
                model_type: ModelType::Base
            }
        ));
    }

    #[tokio::test]
    async fn test_query_single_propagates_unknown_vendor() {
        let orchestrator = orchestrator(&[]);
        let err = orchestrator
            .query_single("hi", "cohere", ModelType::Instruct, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVendor(_)));
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short"), "short");
        let long = "x".repeat(60);
        assert_eq!(truncate_for_log(&long), format!("{}...", "x".repeat(50)));
    }
}
