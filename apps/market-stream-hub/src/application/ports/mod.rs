//! Port Interfaces
//!
//! Defines the interfaces (ports) for external systems following
//! the Hexagonal Architecture pattern. These are the contracts that
//! infrastructure adapters must implement.
//!
//! ## Driven Ports (Outbound)
//!
//! - `CachePort`: Key/value store with TTL and pattern delete
//! - `TickBus`: Broadcast channel carrying tick events
//! - `MarketDataProvider`: Quote, chart and search lookups
//! - `ReferenceTable`: Static symbol reference data
//! - `FeedInterest`: Upstream feed subscribe/unsubscribe
//!
//! ## Driver Ports (Inbound)
//!
//! - `TickSink`: Receives decoded ticks from the feed
//! - `LocalDelivery`: In-process fan-out used when the bus is down

mod cache_port;
mod feed_port;
mod market_data_port;
mod reference_port;
mod tick_bus_port;

#[cfg(test)]
pub use cache_port::MockCachePort;
pub use cache_port::{CacheError, CachePort};
pub use feed_port::{FeedInterest, LocalDelivery, TickSink};
pub use market_data_port::{
    ChartBar, ChartData, ChartRequest, MarketDataProvider, ProviderError, ProviderQuote,
    SearchQuote,
};
pub use reference_port::{ReferenceStock, ReferenceTable};
pub use tick_bus_port::{BusError, TickBus, TickStream};
