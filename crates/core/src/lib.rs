//! # AdSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The rate-governed executor for ad platform calls ([`limiter`])
//! - Port/adapter interfaces (traits) for the campaign store, the platform
//!   and credentials
//! - The reconciliation service ([`sync::SyncValidator`])
//!
//! ## Architecture Principles
//! - Only depends on `adsync-common` and `adsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod limiter;
pub mod sync;

pub use limiter::{
    AccountKey, ErrorClass, LimiterConfig, LimiterError, RateLimitClassifier, RateLimiter,
    RemoteError, TaskHandle, TaskSpec,
};
pub use sync::{
    CampaignPage, CampaignSource, CampaignStore, CredentialsProvider, RemoteSnapshotFetcher,
    SyncValidator, ValidatorConfig,
};
