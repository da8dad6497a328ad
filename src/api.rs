//! HTTP API
//!
//! Priced catalog reads served from the [`PriceBook`], plus a stateless
//! resolve endpoint for callers that bring their own products and campaigns.

use std::sync::Arc;
use axum::{extract::{Path, Query, State}, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post}, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use validator::Validate;
use crate::catalog::PgCatalog;
use crate::config::AppConfig;
use crate::domain::aggregates::{parse_campaigns, Campaign, PricedProduct, Product};
use crate::domain::services::pricing;
use crate::snapshot::{self, PriceBook, RefreshSummary};
use crate::PricingError;

#[derive(Clone)]
pub struct AppState {
    pub book: Arc<PriceBook>,
    pub catalog: Option<PgCatalog>,
    pub config: Arc<AppConfig>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront-pricing"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/campaigns/live", get(live_campaigns))
        .route("/api/v1/pricing/resolve", post(resolve_prices))
        .route("/api/v1/catalog/refresh", post(refresh_catalog))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = match &self {
            PricingError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            PricingError::Validation(_) | PricingError::InvalidPrice(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::TooManyProducts { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PricingError::CatalogUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() { tracing::error!(error = %self, "request failed"); }
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1))]
    pub per_page: Option<u32>,
    pub gender: Option<String>,
    pub category: Option<String>,
    pub child_category: Option<String>,
    pub on_sale: Option<bool>,
    /// Price as of this instant instead of now.
    pub at: Option<DateTime<Utc>>,
}

impl ListParams {
    fn keeps(&self, p: &PricedProduct) -> bool {
        fn eq(want: &Option<String>, have: &Option<String>) -> bool { want.is_none() || want == have }
        eq(&self.gender, &p.gender) && eq(&self.category, &p.category) && eq(&self.child_category, &p.child_category)
            && self.on_sale.map_or(true, |s| s == p.is_on_sale())
    }
}

#[derive(Debug, Serialize)] pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: usize, pub page: u32 }

async fn list_products(State(s): State<AppState>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<PricedProduct>>, PricingError> {
    p.validate()?;
    let page = p.page.unwrap_or(1); let per_page = p.per_page.unwrap_or(20).min(s.config.max_page_size);
    let priced = s.book.priced(p.at.unwrap_or_else(Utc::now)).await;
    let matching: Vec<&PricedProduct> = priced.iter().filter(|item| p.keeps(item)).collect();
    let skip = (page as usize - 1).saturating_mul(per_page as usize);
    let data = matching.iter().skip(skip).take(per_page as usize).map(|item| (*item).clone()).collect();
    Ok(Json(PaginatedResponse { data, total: matching.len(), page }))
}

#[derive(Debug, Deserialize)] pub struct AtParams { pub at: Option<DateTime<Utc>> }

async fn get_product(State(s): State<AppState>, Path(id): Path<String>, Query(q): Query<AtParams>) -> Result<Json<PricedProduct>, PricingError> {
    s.book.find(&id, q.at.unwrap_or_else(Utc::now)).await.map(Json).ok_or(PricingError::ProductNotFound(id))
}

async fn live_campaigns(State(s): State<AppState>, Query(q): Query<AtParams>) -> Json<Vec<Campaign>> {
    Json(s.book.live_campaigns(q.at.unwrap_or_else(Utc::now)).await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub products: Vec<Product>,
    #[serde(default)]
    pub campaigns: Vec<Value>,
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse { pub data: Vec<PricedProduct>, pub skipped_campaigns: usize }

async fn resolve_prices(State(s): State<AppState>, Json(r): Json<ResolveRequest>) -> Result<Json<ResolveResponse>, PricingError> {
    let max = s.config.max_resolve_products as usize;
    if r.products.len() > max { return Err(PricingError::TooManyProducts { got: r.products.len(), max }); }
    let parsed = parse_campaigns(r.campaigns);
    let data = pricing::resolve(&r.products, &parsed.campaigns, r.now.unwrap_or_else(Utc::now));
    Ok(Json(ResolveResponse { data, skipped_campaigns: parsed.skipped }))
}

async fn refresh_catalog(State(s): State<AppState>) -> Result<Json<RefreshSummary>, PricingError> {
    let catalog = s.catalog.as_ref().ok_or(PricingError::CatalogUnavailable)?;
    Ok(Json(snapshot::refresh(catalog, &s.book).await?))
}
