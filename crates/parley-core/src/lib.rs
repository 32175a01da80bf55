//! # parley-core
//!
//! Core types and abstractions for Parley - the multi-provider model comparison tool.
//!
//! This crate provides:
//! - Model type and selector primitives
//! - The normalized response record shared by every provider
//! - The static model catalog (model lists, defaults, context windows, characteristics)
//! - Configuration system and credential resolution
//! - Common error types

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod response;

pub use catalog::{ModelCatalog, ModelCharacteristics, VendorCatalog};
pub use config::{Config, CredentialSet, DispatchMode, ProviderCredentials};
pub use error::{Error, ProviderError, Result};
pub use model::{ModelSelector, ModelType, Vendor};
pub use response::{NormalizedResponse, TokenUsage};
