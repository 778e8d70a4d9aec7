//! Market Stream Hub Binary
//!
//! Starts the tick ingestion, REST/WebSocket and health servers.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-stream-hub
//! ```
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HUB_HTTP_PORT`: REST and client WebSocket port (default: 5000)
//! - `HUB_HEALTH_PORT`: Health check and metrics port (default: 8082)
//! - `FEED_URL`: Upstream streamer URL
//! - `FEED_SYMBOLS`: Comma-separated symbols streamed from startup
//! - `FEED_RECONNECT_MODE`: fixed | exponential (default: fixed)
//! - `FEED_RECONNECT_DELAY_MS`: Reconnect delay (default: 5000)
//! - `CACHE_BACKEND`, `BUS_BACKEND`: memory | redis (default: memory)
//! - `REDIS_URL`: Required when either backend is redis
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc, Weekday};
use market_stream_hub::application::ports::{CachePort, FeedInterest, TickBus};
use market_stream_hub::application::services::{
    FailOpenCache, HistoryService, HubSettings, MarketStatusService, QuoteService, SearchService,
    SubscriptionHub, SymbolResolver, TickRelay, TradingHours,
};
use market_stream_hub::infrastructure::broadcast::{
    BroadcastConfig, InProcessTickBus, RedisTickBus,
};
use market_stream_hub::infrastructure::cache::{MemoryCache, RedisCache};
use market_stream_hub::infrastructure::config::{Backend, ConfigError, HubConfig, ReconnectMode};
use market_stream_hub::infrastructure::feed::{
    BackoffConfig, HeartbeatConfig, PinnedInterest, ReconnectSettings, TickSource,
    TickSourceConfig,
};
use market_stream_hub::infrastructure::health::{HealthServer, HealthServerState};
use market_stream_hub::infrastructure::http::{ApiServer, ApiState};
use market_stream_hub::infrastructure::reference::NseReferenceTable;
use market_stream_hub::infrastructure::telemetry;
use market_stream_hub::infrastructure::yahoo::{YahooConfig, YahooProvider};
use market_stream_hub::init_metrics;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Market Stream Hub");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = HubConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Shared cache and broadcast channel
    let cache = Arc::new(FailOpenCache::new(build_cache(&config).await?));
    let bus = build_bus(&config).await?;

    // Lookup services
    let provider = Arc::new(YahooProvider::new(&YahooConfig {
        base_url: config.provider.base_url.clone(),
        timeout: config.provider.timeout,
        ..YahooConfig::default()
    })?);
    let reference = Arc::new(NseReferenceTable::new());
    let resolver = Arc::new(SymbolResolver::new(
        provider.clone(),
        Arc::clone(&cache),
        config.home_suffixes.clone(),
    ));
    let hours = trading_hours(&config);
    let quotes = Arc::new(QuoteService::new(
        Arc::clone(&resolver),
        provider.clone(),
        Arc::clone(&cache),
    ));
    let history = Arc::new(HistoryService::new(
        Arc::clone(&resolver),
        provider.clone(),
        Arc::clone(&cache),
        hours.utc_offset,
    ));
    let search = Arc::new(SearchService::new(
        reference,
        provider,
        Arc::clone(&cache),
        config.home_suffixes.clone(),
    ));
    let market = Arc::new(MarketStatusService::new(Arc::clone(&cache), hours));

    // Live path: feed -> relay -> bus -> hub. The relay's local fallback is
    // attached once the hub exists.
    let relay = Arc::new(TickRelay::new(Arc::clone(&cache), Arc::clone(&bus)));
    let source = Arc::new(TickSource::new(tick_source_config(&config), relay.clone()));
    let interest: Arc<dyn FeedInterest> =
        Arc::new(PinnedInterest::new(source.clone(), config.feed.symbols.as_slice()));
    let hub = Arc::new(
        SubscriptionHub::new(
            HubSettings {
                client_queue_capacity: config.clients.queue_capacity,
                replay_max_age: config.clients.replay_max_age,
                ..HubSettings::default()
            },
            Arc::clone(&cache),
            bus,
        )
        .with_feed_interest(interest),
    );
    relay.set_local_fallback(hub.clone());

    let hub_task = hub.start();
    let source_task = source.start();

    // Health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        source.state(),
        Arc::clone(&hub),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // REST and client WebSocket server
    let api_state = Arc::new(ApiState {
        quotes,
        history,
        search,
        market,
        hub: Arc::clone(&hub),
    });
    let api_server = ApiServer::new(config.server.http_port, api_state, shutdown_token.clone());
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!(error = %e, "API server error");
        }
    });

    tracing::info!("Market stream hub ready");

    await_shutdown(shutdown_token).await;

    source.stop();
    hub.stop();
    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = source_task.await;
        let _ = hub_task.await;
        let _ = api_task.await;
    })
    .await;
    if drained.is_err() {
        tracing::warn!("Shutdown timed out, exiting anyway");
    }

    tracing::info!("Market stream hub stopped");
    Ok(())
}

/// Build the cache backend named by the configuration.
async fn build_cache(config: &HubConfig) -> Result<Arc<dyn CachePort>, Box<dyn std::error::Error>> {
    match config.cache_backend {
        Backend::Memory => Ok(Arc::new(MemoryCache::new())),
        Backend::Redis => {
            let url = redis_url(config)?;
            Ok(Arc::new(RedisCache::connect(url).await?))
        }
    }
}

/// Build the broadcast channel named by the configuration.
async fn build_bus(config: &HubConfig) -> Result<Arc<dyn TickBus>, Box<dyn std::error::Error>> {
    match config.bus.backend {
        Backend::Memory => Ok(Arc::new(InProcessTickBus::new(BroadcastConfig {
            capacity: config.bus.capacity,
        }))),
        Backend::Redis => {
            let url = redis_url(config)?;
            Ok(Arc::new(
                RedisTickBus::connect(url, config.bus.channel.clone()).await?,
            ))
        }
    }
}

fn redis_url(config: &HubConfig) -> Result<&str, ConfigError> {
    config
        .redis_url
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))
}

fn tick_source_config(config: &HubConfig) -> TickSourceConfig {
    let reconnect = match config.feed.reconnect_mode {
        ReconnectMode::Fixed => ReconnectSettings::Fixed(config.feed.reconnect_delay),
        ReconnectMode::Exponential => ReconnectSettings::Exponential(BackoffConfig::starting_at(
            config.feed.reconnect_delay,
        )),
    };

    TickSourceConfig {
        url: config.feed.url.clone(),
        symbols: config.feed.symbols.clone(),
        reconnect,
        heartbeat: HeartbeatConfig::new(
            config.feed.heartbeat_interval,
            config.feed.heartbeat_timeout,
        ),
    }
}

fn trading_hours(config: &HubConfig) -> TradingHours {
    let utc_offset = FixedOffset::east_opt(config.market.utc_offset_minutes * 60)
        .unwrap_or_else(|| {
            tracing::warn!(
                minutes = config.market.utc_offset_minutes,
                "Invalid market UTC offset, using UTC"
            );
            Utc.fix()
        });

    TradingHours {
        utc_offset,
        open: config.market.open,
        close: config.market.close,
        trading_days: vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
    }
}

/// Log the parsed configuration.
fn log_config(config: &HubConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        health_port = config.server.health_port,
        cache_backend = config.cache_backend.as_str(),
        bus_backend = config.bus.backend.as_str(),
        feed_symbols = config.feed.symbols.len(),
        "Configuration loaded"
    );
    tracing::debug!(feed_url = %config.feed.url, provider = %config.provider.base_url, "Endpoints");
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
