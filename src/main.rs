use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use coinboard_rs::api;
use coinboard_rs::cache::{CacheCoordinator, FreshnessCache};
use coinboard_rs::clock::SystemClock;
use coinboard_rs::config::{Settings, StoreBackend};
use coinboard_rs::market_data::adapters::coingecko::CoinGeckoClient;
use coinboard_rs::persist::{MemoryStore, SnapshotStore, SqliteStore};
use coinboard_rs::telemetry;

/// Caching API in front of the CoinGecko market data endpoints.
#[derive(Debug, Parser)]
#[command(name = "coinboard", version)]
struct Cli {
    /// Settings file (TOML). Defaults to ./coinboard.toml when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server.bind
    #[arg(long)]
    bind: Option<String>,

    /// Override server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override cache.backend
    #[arg(long, value_enum)]
    store: Option<StoreBackend>,
}

async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match settings.cache.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::connect(&settings.cache.database_url)
                .await
                .context("opening sqlite snapshot store")?,
        ),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok(); // load .env

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(bind) = cli.bind {
        settings.server.bind = bind;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(store) = cli.store {
        settings.cache.backend = store;
    }

    telemetry::init_tracing(&settings.telemetry.log_filter);
    telemetry::init_metrics(settings.telemetry.metrics_port)?;

    let store = open_store(&settings).await?;
    let client = CoinGeckoClient::from_settings(&settings.upstream)?;
    info!(
        upstream = %client.base_url(),
        backend = ?settings.cache.backend,
        ttl_secs = settings.cache.ttl_secs,
        "Cache configured"
    );

    let cache = FreshnessCache::new(store, Arc::new(SystemClock), settings.cache.ttl());
    let coordinator = CacheCoordinator::new(cache, Arc::new(client))
        .with_top_limit(settings.upstream.per_page);
    let app = api::router(Arc::new(coordinator));

    let addr: SocketAddr = format!("{}:{}", settings.server.bind, settings.server.port)
        .parse()
        .context("invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping");
}
