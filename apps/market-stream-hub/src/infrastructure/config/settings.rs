//! Hub Configuration Settings
//!
//! Typed configuration loaded from environment variables. Unparseable values
//! fall back to their defaults; only contradictory settings are errors.

use std::time::Duration;

use chrono::NaiveTime;

/// Symbols streamed from startup and never dropped by client activity.
pub const DEFAULT_SYMBOLS: [&str; 10] = [
    "RELIANCE.NS",
    "TCS.NS",
    "INFY.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "HINDUNILVR.NS",
    "SBIN.NS",
    "BHARTIARTL.NS",
    "KOTAKBANK.NS",
    "ITC.NS",
];

/// Storage backend for the cache or the broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// In-process.
    #[default]
    Memory,
    /// Redis, shared between processes.
    Redis,
}

impl Backend {
    /// Parse a backend name. Unknown names mean in-process.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "redis" => Self::Redis,
            _ => Self::Memory,
        }
    }

    /// Backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

/// Reconnect delay policy for the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconnectMode {
    /// Same delay every attempt.
    #[default]
    Fixed,
    /// Growing delay with jitter.
    Exponential,
}

impl ReconnectMode {
    /// Parse a mode name. Unknown names mean fixed.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "exponential" => Self::Exponential,
            _ => Self::Fixed,
        }
    }
}

/// Listening ports.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// REST and client WebSocket port.
    pub http_port: u16,
    /// Health and metrics port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            http_port: 5000,
            health_port: 8082,
        }
    }
}

/// Upstream feed settings.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Streamer URL.
    pub url: String,
    /// Default symbol set.
    pub symbols: Vec<String>,
    /// Reconnect policy.
    pub reconnect_mode: ReconnectMode,
    /// Fixed delay, or the initial delay for exponential mode.
    pub reconnect_delay: Duration,
    /// Ping interval.
    pub heartbeat_interval: Duration,
    /// Idle time before the connection is dropped.
    pub heartbeat_timeout: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: "wss://streamer.finance.yahoo.com".to_string(),
            symbols: DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect(),
            reconnect_mode: ReconnectMode::Fixed,
            reconnect_delay: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(90),
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone)]
pub struct BusSettings {
    /// Backend.
    pub backend: Backend,
    /// Channel name.
    pub channel: String,
    /// In-process channel capacity.
    pub capacity: usize,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            channel: "market:ticks".to_string(),
            capacity: 10_000,
        }
    }
}

/// Market data provider settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// API base URL.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Per-client delivery settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Outbound queue capacity per connection.
    pub queue_capacity: usize,
    /// Oldest cached tick replayed on join. `None` replays anything cached.
    pub replay_max_age: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            replay_max_age: None,
        }
    }
}

/// Exchange session settings.
#[derive(Debug, Clone)]
pub struct MarketSettings {
    /// Exchange offset from UTC in minutes.
    pub utc_offset_minutes: i32,
    /// Session open, exchange-local.
    pub open: NaiveTime,
    /// Session close, exchange-local.
    pub close: NaiveTime,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 330,
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Complete hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Ports.
    pub server: ServerSettings,
    /// Upstream feed.
    pub feed: FeedSettings,
    /// Cache backend.
    pub cache_backend: Backend,
    /// Broadcast channel.
    pub bus: BusSettings,
    /// Redis URL, required by any Redis backend.
    pub redis_url: Option<String>,
    /// Market data provider.
    pub provider: ProviderSettings,
    /// Client delivery.
    pub clients: ClientSettings,
    /// Exchange session.
    pub market: MarketSettings,
    /// Preferred exchange suffixes, best first.
    pub home_suffixes: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            feed: FeedSettings::default(),
            cache_backend: Backend::Memory,
            bus: BusSettings::default(),
            redis_url: None,
            provider: ProviderSettings::default(),
            clients: ClientSettings::default(),
            market: MarketSettings::default(),
            home_suffixes: vec![".NS".to_string(), ".BO".to_string()],
        }
    }
}

impl HubConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if a Redis backend is selected
    /// without `REDIS_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`HubConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let server = ServerSettings {
            http_port: env.parse("HUB_HTTP_PORT", defaults.server.http_port),
            health_port: env.parse("HUB_HEALTH_PORT", defaults.server.health_port),
        };

        let feed = FeedSettings {
            url: env.string("FEED_URL", &defaults.feed.url),
            symbols: env
                .list("FEED_SYMBOLS")
                .map_or(defaults.feed.symbols, |symbols| {
                    symbols.into_iter().map(|s| s.to_uppercase()).collect()
                }),
            reconnect_mode: env
                .get("FEED_RECONNECT_MODE")
                .map(|s| ReconnectMode::from_str_case_insensitive(&s))
                .unwrap_or_default(),
            reconnect_delay: env.millis("FEED_RECONNECT_DELAY_MS", defaults.feed.reconnect_delay),
            heartbeat_interval: env.secs(
                "FEED_HEARTBEAT_INTERVAL_SECS",
                defaults.feed.heartbeat_interval,
            ),
            heartbeat_timeout: env.secs(
                "FEED_HEARTBEAT_TIMEOUT_SECS",
                defaults.feed.heartbeat_timeout,
            ),
        };

        let cache_backend = env
            .get("CACHE_BACKEND")
            .map(|s| Backend::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let bus = BusSettings {
            backend: env
                .get("BUS_BACKEND")
                .map(|s| Backend::from_str_case_insensitive(&s))
                .unwrap_or_default(),
            channel: env.string("BUS_CHANNEL", &defaults.bus.channel),
            capacity: env.parse("BUS_CAPACITY", defaults.bus.capacity).max(1),
        };

        let redis_url = env.get("REDIS_URL");
        for (name, backend) in [("CACHE_BACKEND", cache_backend), ("BUS_BACKEND", bus.backend)] {
            if backend == Backend::Redis && redis_url.is_none() {
                return Err(ConfigError::MissingEnvVar(format!(
                    "REDIS_URL (required by {name}=redis)"
                )));
            }
        }

        let provider = ProviderSettings {
            base_url: env.string("PROVIDER_BASE_URL", &defaults.provider.base_url),
            timeout: env.secs("PROVIDER_TIMEOUT_SECS", defaults.provider.timeout),
        };

        let clients = ClientSettings {
            queue_capacity: env
                .parse("HUB_CLIENT_QUEUE_CAPACITY", defaults.clients.queue_capacity)
                .max(1),
            replay_max_age: env
                .get("HUB_REPLAY_MAX_AGE_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        };

        let market = MarketSettings {
            utc_offset_minutes: env
                .parse(
                    "MARKET_UTC_OFFSET_MINUTES",
                    defaults.market.utc_offset_minutes,
                )
                .clamp(-24 * 60 + 1, 24 * 60 - 1),
            open: env.time("MARKET_OPEN", defaults.market.open),
            close: env.time("MARKET_CLOSE", defaults.market.close),
        };

        let home_suffixes = env
            .list("HOME_EXCHANGE_SUFFIXES")
            .map_or(defaults.home_suffixes, |suffixes| {
                suffixes
                    .into_iter()
                    .map(|s| {
                        let s = s.to_uppercase();
                        if s.starts_with('.') { s } else { format!(".{s}") }
                    })
                    .collect()
            });

        Ok(Self {
            server,
            feed,
            cache_backend,
            bus,
            redis_url,
            provider,
            clients,
            market,
            home_suffixes,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
}

// =============================================================================
// Parsing Helpers
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed, non-empty value.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn secs(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(default, Duration::from_secs)
    }

    fn millis(&self, key: &str, default: Duration) -> Duration {
        self.get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map_or(default, Duration::from_millis)
    }

    fn time(&self, key: &str, default: NaiveTime) -> NaiveTime {
        self.get(key)
            .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
            .unwrap_or(default)
    }

    /// Comma-separated list; `None` when unset or empty.
    fn list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = self
            .get(key)?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        (!items.is_empty()).then_some(items)
    }
}
