//! # parley-compare
//!
//! Comparison orchestration for Parley.
//!
//! This crate provides:
//! - Single-pair queries against one provider
//! - Cartesian fan-out of a query across vendors and model types
//! - Sequential or concurrent dispatch with request-ordered results

pub mod orchestrator;

pub use orchestrator::{ComparisonBatch, Orchestrator};
