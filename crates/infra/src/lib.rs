//! # AdSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The SQLite campaign store
//! - The HTTP client and the Marketing API adapter
//! - Configuration loading and credential resolution
//! - The periodic reconciliation scheduler
//!
//! ## Architecture
//! - Implements traits defined in `adsync-core`
//! - Depends on `adsync-domain` and `adsync-core`
//! - Contains all "impure" code (I/O, network, clocks)

pub mod config;
pub mod credentials;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;
pub mod platform;
pub mod scheduling;

// Re-export commonly used items
pub use credentials::StaticCredentialsProvider;
pub use database::{DbManager, SqliteCampaignStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
pub use platform::{MarketingApiClient, MarketingApiConfig};
pub use scheduling::{SchedulerError, SyncScheduler, SyncSchedulerConfig};
