//! # parley-providers
//!
//! Multi-provider model abstraction layer for Parley.
//!
//! This crate provides:
//! - Provider trait for abstracting model vendors
//! - Implementations for OpenAI, Anthropic and the Hugging Face Inference API
//! - Response normalization into [`parley_core::NormalizedResponse`]
//! - Token estimation and context-window checks
//! - Provider registry with credential gating

mod http;

pub mod anthropic;
pub mod huggingface;
pub mod normalize;
pub mod openai;
pub mod registry;
pub mod tokenizer;
pub mod traits;

pub use anthropic::AnthropicProvider;
pub use huggingface::HuggingFaceProvider;
pub use normalize::ResponseNormalizer;
pub use openai::OpenAIProvider;
pub use registry::ProviderRegistry;
pub use tokenizer::{
    FitReport, HeuristicCounter, PromptBudget, TextStats, TokenCounter, TokenEstimator,
};
#[cfg(feature = "tiktoken")]
pub use tokenizer::TiktokenCounter;
pub use traits::{GenerateOptions, Provider, VendorReply};
