//! Static model catalog: model lists, per-type defaults, context windows and
//! descriptive characteristics for each vendor.
//!
//! The catalog is data, not code. A built-in copy is embedded from
//! `catalog.toml`; a replacement file with the same layout can be supplied
//! through configuration. Providers receive their [`VendorCatalog`] at
//! construction time and never consult global tables.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ModelType, Vendor};

const BUILTIN_CATALOG: &str = include_str!("catalog.toml");

/// Context window used when neither the model nor the vendor declares one.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 4096;

static BUILTIN: OnceCell<ModelCatalog> = OnceCell::new();

/// Descriptive metadata about a model. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelCharacteristics {
    pub training_cutoff: String,
    pub strengths: Vec<String>,
    pub use_cases: Vec<String>,
    pub fine_tuning_strategy: String,
    pub instruction_following: String,
    pub cost_per_1k_tokens: String,
}

/// Models offered for one model type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSlot {
    /// Model chosen when the caller names none
    pub default: Option<String>,
    /// All known models of this type
    pub models: Vec<String>,
}

fn default_context_window() -> u32 {
    DEFAULT_CONTEXT_WINDOW
}

/// Catalog entries for a single vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorCatalog {
    #[serde(default)]
    pub base: ModelSlot,
    #[serde(default)]
    pub instruct: ModelSlot,
    #[serde(default, rename = "fine-tuned")]
    pub fine_tuned: ModelSlot,
    /// Window reported for models missing from `context_windows`
    #[serde(default = "default_context_window")]
    pub default_context_window: u32,
    #[serde(default)]
    pub context_windows: BTreeMap<String, u32>,
    /// Characteristics reported for models missing from `characteristics`
    #[serde(default)]
    pub fallback: ModelCharacteristics,
    #[serde(default)]
    pub characteristics: BTreeMap<String, ModelCharacteristics>,
}

impl Default for VendorCatalog {
    fn default() -> Self {
        Self {
            base: ModelSlot::default(),
            instruct: ModelSlot::default(),
            fine_tuned: ModelSlot::default(),
            default_context_window: DEFAULT_CONTEXT_WINDOW,
            context_windows: BTreeMap::new(),
            fallback: ModelCharacteristics::default(),
            characteristics: BTreeMap::new(),
        }
    }
}

impl VendorCatalog {
    fn slot(&self, model_type: ModelType) -> &ModelSlot {
        match model_type {
            ModelType::Base => &self.base,
            ModelType::Instruct => &self.instruct,
            ModelType::FineTuned => &self.fine_tuned,
        }
    }

    /// Default model for a type, if the vendor has one.
    pub fn default_model(&self, model_type: ModelType) -> Option<&str> {
        self.slot(model_type)
            .default
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Known models for a type.
    pub fn models(&self, model_type: ModelType) -> &[String] {
        &self.slot(model_type).models
    }

    /// Model lists keyed by type, in canonical type order.
    pub fn available_models(&self) -> BTreeMap<ModelType, Vec<String>> {
        ModelType::ALL
            .iter()
            .map(|t| (*t, self.models(*t).to_vec()))
            .collect()
    }

    /// Context window for a model, falling back to the vendor default.
    pub fn context_window(&self, model_name: &str) -> u32 {
        self.context_windows
            .get(model_name)
            .copied()
            .unwrap_or(self.default_context_window)
    }

    /// Characteristics for a model, falling back to the vendor's generic record.
    pub fn characteristics(&self, model_name: &str) -> ModelCharacteristics {
        self.characteristics
            .get(model_name)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// The full catalog, one entry per vendor id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(flatten)]
    vendors: BTreeMap<String, VendorCatalog>,
}

impl ModelCatalog {
    /// The catalog shipped with Parley.
    pub fn builtin() -> Result<Self> {
        BUILTIN
            .get_or_try_init(|| Self::from_toml(BUILTIN_CATALOG))
            .cloned()
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Catalog(e.to_string()))
    }

    /// Read a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Catalog(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Load the configured catalog, or the built-in one when no path is set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "Loading model catalog");
                Self::from_path(p)
            }
            None => Self::builtin(),
        }
    }

    /// Catalog for one vendor.
    pub fn vendor(&self, vendor: Vendor) -> Result<&VendorCatalog> {
        self.vendors
            .get(vendor.id())
            .ok_or_else(|| Error::Catalog(format!("no catalog entry for '{}'", vendor)))
    }

    /// Insert or replace a vendor entry.
    pub fn insert(&mut self, vendor: Vendor, catalog: VendorCatalog) {
        self.vendors.insert(vendor.id().to_string(), catalog);
    }
}
