//! Aggregates module
pub mod product;
pub mod campaign;

pub use product::{AppliedCampaign, PricedProduct, Product};
pub use campaign::{parse_campaigns, Campaign, CampaignError, CampaignRecord, Discount, ParsedCampaigns, Scope};
