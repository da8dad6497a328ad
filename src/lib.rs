//! Storefront Pricing
//!
//! Resolves the effective price of catalog products against time-windowed
//! promotional campaigns.
//!
//! ## Features
//! - Best-discount selection across overlapping campaigns
//! - Typed campaign scopes (all, product, parent/child category)
//! - Lenient ingestion of campaign records
//! - In-memory price book with memoized resolution
//! - Read-only PostgreSQL catalog source and HTTP API

pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod snapshot;

pub use domain::aggregates::{Campaign, Discount, PricedProduct, Product, Scope};
pub use domain::services::pricing::resolve;
pub use domain::value_objects::Price;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Catalog database not configured")]
    CatalogUnavailable,

    #[error("Too many products: {got} (max {max})")]
    TooManyProducts { got: usize, max: usize },

    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] domain::value_objects::PriceError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, PricingError>;
