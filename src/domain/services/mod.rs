//! Domain services
pub mod pricing;

pub use pricing::{best_offer, live_campaigns, price_product, resolve};
