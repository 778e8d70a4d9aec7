#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Market Stream Hub - Tick Ingestion and Fan-out
//!
//! Holds a single connection to an upstream price streamer, decodes its
//! base64 tick records, stores the latest tick per symbol, and fans ticks
//! out to WebSocket clients grouped into per-symbol rooms. Alongside the
//! live stream it serves cached quote, history and search lookups backed by
//! a remote market data provider.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Market records and room membership
//!   - `market`: Ticks, quotes, candles, symbol rules, periods
//!   - `subscription`: Connection to room bookkeeping
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Cache, bus, provider, reference and feed interfaces
//!   - `services`: Relay, hub, quote, history, search, market status
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `feed`: Upstream WebSocket client and frame decoder
//!   - `cache`, `broadcast`: Memory and Redis backends
//!   - `yahoo`, `reference`: Provider adapter and NSE table
//!   - `http`, `health`: REST, client WebSocket, health checks
//!   - `config`, `metrics`, `telemetry`: Process plumbing
//!
//! # Data Flow
//!
//! ```text
//! Streamer WS --> TickSource --> TickRelay --+--> Cache (latest tick)
//!                    ^                        |
//!                    |                        +--> TickBus --> SubscriptionHub --> Client 1
//!                    |                                              |        --> Client 2
//!                    +------ first join / last leave ---------------+        --> Client N
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Market records and rules with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::market::{Candle, CandleTime, MarketStatus, Quote, SearchResult, Tick, TickEvent};
pub use domain::subscription::{ConnectionId, RoomTable, SubscriptionChanges};

// Application services
pub use application::services::{
    FailOpenCache, HistoryService, HubSettings, HubStats, MarketStatusService, QuoteService,
    SearchService, ServiceError, SubscriptionHub, SymbolResolver, TickRelay, TradingHours,
};

// Infrastructure config
pub use infrastructure::config::{
    Backend, BusSettings, ClientSettings, ConfigError, FeedSettings, HubConfig, MarketSettings,
    ProviderSettings, ReconnectMode, ServerSettings,
};

// Feed
pub use infrastructure::feed::{
    ConnectionState, DecodeError, FeedState, FeedStatus, PinnedInterest, TickSource,
    TickSourceConfig, decode_frame, decode_tick,
};

// Servers
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};
pub use infrastructure::http::{ApiServer, ApiServerError, ApiState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
