//! Live and historical host telemetry over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use system_metrics_lib::{
    build_router, sysinfo_probe_factory, AppState, MemoryStore, MetricsStore, RedisStore,
    RollingStore, ServerConfig, StoreBackend, StreamRegistry,
};

#[derive(Parser)]
#[command(name = "system-metrics-api")]
#[command(about = "Serve live and historical system metrics over HTTP")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(long, env = "METRICS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "METRICS_PORT", default_value_t = 5000)]
    port: u16,

    /// Where sample history is kept
    #[arg(long, env = "METRICS_STORE", value_enum, default_value_t = StoreBackend::Redis)]
    store: StoreBackend,

    /// Redis connection URL (redis store only)
    #[arg(long, env = "REDIS_URL", default_value = "redis://redis:6379")]
    redis_url: String,

    /// Redis list key holding the history
    #[arg(long, env = "METRICS_HISTORY_KEY", default_value = "metrics")]
    history_key: String,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        ServerConfig {
            host: cli.host,
            port: cli.port,
            store: cli.store,
            redis_url: cli.redis_url,
            history_key: cli.history_key,
        }
    }
}

async fn open_store(config: &ServerConfig) -> Result<Arc<dyn MetricsStore>> {
    match config.store {
        StoreBackend::Redis => {
            let store = RedisStore::open(&config.redis_url, config.history_key.clone())
                .with_context(|| format!("invalid redis url {}", config.redis_url))?;
            store.warm_up().await;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("using in-memory history; samples are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn shutdown_signal(streams: StreamRegistry) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutting down, closing {} live streams", streams.len());
    streams.cancel_all();
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Cli::parse());
    let backend = open_store(&config).await?;
    let streams = StreamRegistry::new();

    let app = build_router(AppState {
        store: RollingStore::new(backend),
        probes: sysinfo_probe_factory(),
        streams: streams.clone(),
    });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("System Metrics API listening on {} ({} store)", addr, config.store);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(streams))
        .await
        .context("server error")?;
    Ok(())
}
