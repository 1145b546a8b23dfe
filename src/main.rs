//! OpenSASE Storefront - catalog, store, cart, order and review service

use anyhow::Result;
use opensase_storefront::{media::LocalBlobStore, router, AppConfig, AppState};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let media = LocalBlobStore::new(config.media_root.clone(), config.media_url.clone());
    let state = AppState { db, media: Arc::new(media) };

    let mut app = router(state);
    // Uploads are served locally only when the media URL is a path on this host.
    if config.media_url.starts_with('/') && config.media_url.len() > 1 {
        app = app.nest_service(&config.media_url, ServeDir::new(&config.media_root));
    }

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!("🚀 OpenSASE Storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
