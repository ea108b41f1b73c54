//! Campaign reconciliation between the local store and the ad platform.

pub mod budget;
pub mod ports;
pub mod snapshot;
pub mod validator;

pub use ports::{CampaignPage, CampaignSource, CampaignStore, CredentialsProvider};
pub use snapshot::RemoteSnapshotFetcher;
pub use validator::{SyncValidator, ValidatorConfig};
