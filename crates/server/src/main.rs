use std::sync::Arc;

use anyhow::Context;
use seriestrack_metadata::lookup::Lookup;
use seriestrack_metadata::tmdb::TmdbClient;
use seriestrack_server::recheck;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // DB path: use SERIESTRACK_DB env or default
    let db_path = std::env::var("SERIESTRACK_DB").unwrap_or_else(|_| "seriestrack.db".to_string());
    info!(db_path = %db_path, "connecting to database");

    let pool = seriestrack_db::connect(&db_path)
        .await
        .context("failed to connect to database")?;

    // Run migrations
    seriestrack_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!("migrations complete");

    // Metadata provider
    let lookup = match std::env::var("SERIESTRACK_TMDB_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let language = std::env::var("SERIESTRACK_TMDB_LANGUAGE")
                .unwrap_or_else(|_| "zh-CN".to_string());
            info!(language = %language, "TMDB provider configured");
            Some(Lookup::new(Arc::new(TmdbClient::new(key, language))))
        }
        _ => {
            warn!("SERIESTRACK_TMDB_KEY not set; lookups and completion checks are disabled");
            None
        }
    };

    let app_state = seriestrack_server::state::AppState { db: pool, lookup };

    // Spawn suspicious-completion recheck loop
    if app_state.lookup.is_some() {
        let raw = std::env::var("SERIESTRACK_RECHECK_SECS").ok();
        let every = recheck::recheck_interval(raw.as_deref());
        info!(every_secs = every.as_secs(), "suspicious recheck scheduled");
        tokio::spawn(recheck::run_recheck_loop(app_state.clone(), every));
    }

    let app = seriestrack_server::routes::build_router(app_state);

    let bind_addr =
        std::env::var("SERIESTRACK_BIND").unwrap_or_else(|_| "0.0.0.0:8097".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
