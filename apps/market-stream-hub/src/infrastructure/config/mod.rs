//! Configuration Module
//!
//! Environment-driven configuration for the hub.

mod settings;

pub use settings::{
    Backend, BusSettings, ClientSettings, ConfigError, DEFAULT_SYMBOLS, FeedSettings, HubConfig,
    MarketSettings, ProviderSettings, ReconnectMode, ServerSettings,
};
