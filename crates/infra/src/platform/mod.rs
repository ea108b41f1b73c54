//! Ad platform marketing API adapter.
//!
//! Implements the core [`CampaignSource`](adsync_core::sync::CampaignSource)
//! port over the platform's versioned HTTP read API.

mod client;
mod errors;
mod types;

pub use client::{MarketingApiClient, MarketingApiConfig};
