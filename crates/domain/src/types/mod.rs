//! Domain types and models

pub mod account;
pub mod campaign;
pub mod validation;

pub use account::{AccountCredentials, SyncScope};
pub use campaign::{
    BudgetType, CampaignInsights, CampaignUpdate, EntityStatus, LocalAdSet, LocalCampaign,
    RemoteAdSet, RemoteCampaign,
};
pub use validation::{
    AutoFixOutcome, AutoSyncReport, CampaignValidation, SyncValidationResult, ValidationIssue,
};
