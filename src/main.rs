//! Storefront Pricing - campaign price resolution service

use anyhow::Result;
use std::sync::Arc;
use storefront_pricing::{api::{self, AppState}, catalog::PgCatalog, config::AppConfig, snapshot::{self, PriceBook}};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Arc::new(AppConfig::load()?);
    let book = Arc::new(PriceBook::new());

    let catalog = match config.database_url.as_deref() {
        Some(url) => {
            let catalog = PgCatalog::connect(url, config.db_max_connections).await?;
            catalog.migrate().await?;
            let summary = snapshot::refresh(&catalog, &book).await?;
            tracing::info!(products = summary.products, campaigns = summary.campaigns, "initial catalog loaded");
            snapshot::spawn_refresh(catalog.clone(), book.clone(), config.refresh_interval());
            Some(catalog)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving the stateless resolve endpoint only");
            None
        }
    };

    let app = api::router(AppState { book, catalog, config: config.clone() });
    tracing::info!("🚀 Storefront pricing listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app)
        .with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await { tracing::error!(error = %e, "failed to listen for ctrl-c"); std::future::pending::<()>().await; }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => { s.recv().await; }
            Err(e) => { tracing::error!(error = %e, "failed to install SIGTERM handler"); std::future::pending::<()>().await; }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
