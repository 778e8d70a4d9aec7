//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `FailOpenCache`: The single cache adapter every service goes through
//! - `SymbolResolver`: Maps user input to a provider symbol
//! - `QuoteService`, `HistoryService`, `SearchService`: On-demand lookups
//! - `MarketStatusService`: Exchange open/closed status
//! - `TickRelay`: Persists and publishes live ticks
//! - `SubscriptionHub`: Room membership, replay-on-join and fan-out

use std::sync::Arc;

use chrono::{DateTime, Utc};

mod cache;
mod error;
mod history;
mod hub;
mod market_status;
mod quote;
mod relay;
mod resolver;
mod search;

pub use cache::FailOpenCache;
pub use error::ServiceError;
pub use history::HistoryService;
pub use hub::{HubSettings, HubStats, SubscriptionHub};
pub use market_status::{MarketStatusService, TradingHours};
pub use quote::QuoteService;
pub use relay::TickRelay;
pub use resolver::SymbolResolver;
pub use search::SearchService;

/// Wall-clock source, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The system clock.
#[must_use]
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
