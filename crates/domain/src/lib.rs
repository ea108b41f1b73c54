//! # AdSync Domain
//!
//! Business domain types and models for AdSync.
//!
//! This crate contains:
//! - Campaign and ad set records as the local store and the ad platform see
//!   them
//! - Reconciliation results (per-campaign validation, auto-fix outcomes)
//! - Domain error types and Result definitions
//! - Configuration structures and their defaults
//!
//! ## Architecture
//! - No dependencies on other AdSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
