//! Database implementations

pub mod campaign_store;
pub mod manager;

pub use campaign_store::SqliteCampaignStore;
pub use manager::{DbManager, SqliteConnection};
