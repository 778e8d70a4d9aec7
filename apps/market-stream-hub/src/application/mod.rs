//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and the port interfaces
//! that decouple them from the cache, broadcast channel, market-data
//! provider and upstream feed.

/// Port interfaces for external systems (cache, bus, provider, feed).
pub mod ports;

/// Application services for quotes, history, search, relay and fan-out.
pub mod services;
