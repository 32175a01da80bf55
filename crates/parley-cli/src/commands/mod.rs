//! CLI command implementations.

pub mod compare;
pub mod doctor;
pub mod models;
pub mod providers;
pub mod query;
pub mod tokens;
