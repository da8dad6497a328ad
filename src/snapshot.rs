//! In-memory price book.
//!
//! Holds the catalog snapshot currently in service and memoizes the resolved
//! prices. Resolution depends only on the snapshot and on which campaigns are
//! live, so the memo is keyed on the snapshot generation plus the live set;
//! it survives the clock moving forward until a campaign starts or ends.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use crate::catalog::PgCatalog;
use crate::domain::aggregates::{Campaign, PricedProduct, Product};
use crate::domain::services::pricing::price_product;
use crate::Result;

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub products: Vec<Product>,
    pub campaigns: Vec<Campaign>,
    pub loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    fn live_indexes(&self, now: DateTime<Utc>) -> Vec<usize> {
        self.campaigns.iter().enumerate().filter(|(_, c)| c.is_live(now)).map(|(i, _)| i).collect()
    }
}

struct Memo {
    generation: u64,
    live: Vec<usize>,
    priced: Arc<Vec<PricedProduct>>,
}

pub struct PriceBook {
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    memo: Mutex<Option<Memo>>,
}

impl Default for PriceBook {
    fn default() -> Self { Self::with_catalog(Vec::new(), Vec::new()) }
}

impl PriceBook {
    pub fn new() -> Self { Self::default() }

    pub fn with_catalog(products: Vec<Product>, campaigns: Vec<Campaign>) -> Self {
        let snapshot = CatalogSnapshot { generation: 0, products, campaigns, loaded_at: Utc::now() };
        Self { snapshot: RwLock::new(Arc::new(snapshot)), memo: Mutex::new(None) }
    }

    /// Swaps in a new catalog; returns its generation.
    pub async fn replace(&self, products: Vec<Product>, campaigns: Vec<Campaign>) -> u64 {
        let mut guard = self.snapshot.write().await;
        let generation = guard.generation + 1;
        *guard = Arc::new(CatalogSnapshot { generation, products, campaigns, loaded_at: Utc::now() });
        generation
    }

    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> { self.snapshot.read().await.clone() }

    /// Every product priced at `now`, in catalog order.
    pub async fn priced(&self, now: DateTime<Utc>) -> Arc<Vec<PricedProduct>> {
        let snapshot = self.snapshot().await;
        self.priced_in(&snapshot, now).await
    }

    async fn priced_in(&self, snapshot: &CatalogSnapshot, now: DateTime<Utc>) -> Arc<Vec<PricedProduct>> {
        let live = snapshot.live_indexes(now);
        let mut memo = self.memo.lock().await;
        if let Some(m) = memo.as_ref() {
            if m.generation == snapshot.generation && m.live == live {
                tracing::debug!(generation = m.generation, "price book hit");
                return m.priced.clone();
            }
        }
        let campaigns: Vec<&Campaign> = live.iter().map(|&i| &snapshot.campaigns[i]).collect();
        let priced = Arc::new(snapshot.products.iter().map(|p| price_product(p, &campaigns)).collect::<Vec<_>>());
        tracing::debug!(generation = snapshot.generation, live = live.len(), products = priced.len(), "price book recomputed");
        // A caller still holding an older snapshot must not evict a newer memo.
        if memo.as_ref().map_or(true, |m| snapshot.generation >= m.generation) {
            *memo = Some(Memo { generation: snapshot.generation, live, priced: priced.clone() });
        }
        priced
    }

    pub async fn find(&self, id: &str, now: DateTime<Utc>) -> Option<PricedProduct> {
        self.priced(now).await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn live_campaigns(&self, now: DateTime<Utc>) -> Vec<Campaign> {
        self.snapshot().await.campaigns.iter().filter(|c| c.is_live(now)).cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub generation: u64,
    pub products: usize,
    pub campaigns: usize,
    pub skipped_campaigns: usize,
}

/// Loads the catalog and swaps it into `book`.
pub async fn refresh(catalog: &PgCatalog, book: &PriceBook) -> Result<RefreshSummary> {
    let load = catalog.load().await?;
    let (products, campaigns) = (load.products.len(), load.campaigns.len());
    let generation = book.replace(load.products, load.campaigns).await;
    Ok(RefreshSummary { generation, products, campaigns, skipped_campaigns: load.skipped_campaigns })
}

/// Reloads the catalog on a fixed period. A failed reload keeps the previous snapshot.
pub fn spawn_refresh(catalog: PgCatalog, book: Arc<PriceBook>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match refresh(&catalog, &book).await {
                Ok(s) => tracing::info!(generation = s.generation, products = s.products, campaigns = s.campaigns, "catalog refreshed"),
                Err(e) => tracing::warn!(error = %e, "catalog refresh failed, keeping previous snapshot"),
            }
        }
    })
}
