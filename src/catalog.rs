//! Read-only PostgreSQL catalog source.
//!
//! Loads active products and all campaigns. Campaign rows go through the same
//! lenient conversion as JSON input, so a bad row is skipped and logged.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use crate::domain::aggregates::{Campaign, CampaignRecord, Product};
use crate::domain::aggregates::campaign::{DiscountRecord, ScopeRecord};
use crate::domain::aggregates::product::strip_reserved;
use crate::domain::value_objects::Price;
use crate::Result;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub gender: Option<String>,
    pub category: Option<String>,
    pub child_category: Option<String>,
    pub metadata: Json<Value>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discount: Json<Value>,
    pub scope: Json<Value>,
}

impl TryFrom<ProductRow> for Product {
    type Error = crate::PricingError;

    fn try_from(row: ProductRow) -> Result<Self> {
        let mut attributes = match row.metadata.0 {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        strip_reserved(&mut attributes);
        attributes.insert("name".into(), Value::String(row.name));
        Ok(Product {
            id: row.id, price: Price::new(row.price)?,
            gender: row.gender, category: row.category, child_category: row.child_category,
            attributes,
        })
    }
}

impl From<CampaignRow> for CampaignRecord {
    fn from(row: CampaignRow) -> Self {
        CampaignRecord {
            id: Some(Value::String(row.id)),
            name: row.name,
            is_active: Some(row.is_active),
            start_date: Some(row.start_date.to_rfc3339_opts(SecondsFormat::Micros, true)),
            end_date: Some(row.end_date.to_rfc3339_opts(SecondsFormat::Micros, true)),
            discount: serde_json::from_value::<DiscountRecord>(row.discount.0).ok(),
            scope: serde_json::from_value::<ScopeRecord>(row.scope.0).ok(),
        }
    }
}

/// Everything the price book needs from one load.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoad {
    pub products: Vec<Product>,
    pub campaigns: Vec<Campaign>,
    pub skipped_products: usize,
    pub skipped_campaigns: usize,
}

#[derive(Clone)]
pub struct PgCatalog { pool: PgPool }

impl PgCatalog {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn load(&self) -> Result<CatalogLoad> {
        let product_rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name, price, gender, category, child_category, metadata FROM products WHERE status = 'active' ORDER BY created_at, id")
            .fetch_all(&self.pool).await?;
        let campaign_rows = sqlx::query_as::<_, CampaignRow>(
            "SELECT id, name, is_active, start_date, end_date, discount, scope FROM campaigns ORDER BY created_at, id")
            .fetch_all(&self.pool).await?;

        let mut load = CatalogLoad::default();
        for row in product_rows {
            let id = row.id.clone();
            match Product::try_from(row) {
                Ok(p) => load.products.push(p),
                Err(e) => { tracing::warn!(product_id = %id, error = %e, "skipping product"); load.skipped_products += 1; }
            }
        }
        for row in campaign_rows {
            let id = row.id.clone();
            match Campaign::try_from(CampaignRecord::from(row)) {
                Ok(c) => load.campaigns.push(c),
                Err(e) => { tracing::warn!(campaign_id = %id, error = %e, "skipping campaign"); load.skipped_campaigns += 1; }
            }
        }
        tracing::info!(products = load.products.len(), campaigns = load.campaigns.len(),
            skipped_products = load.skipped_products, skipped_campaigns = load.skipped_campaigns, "catalog loaded");
        Ok(load)
    }
}
