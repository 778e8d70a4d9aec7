//! Broadcast Channel Adapters
//!
//! Implementations of the [`TickBus`] port.
//!
//! # Backends
//!
//! - [`InProcessTickBus`]: A tokio broadcast channel. Relay and hub must
//!   share the process.
//! - [`RedisTickBus`]: Redis pub/sub. Ingestion and fan-out may run in
//!   separate processes.
//!
//! Both carry [`TickEvent`]s. Subscribers that fall behind the in-process
//! channel's capacity skip the missed events rather than stalling the sender.

mod redis_bus;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::application::ports::{BusError, TickBus, TickStream};
use crate::domain::market::TickEvent;

pub use redis_bus::RedisTickBus;

/// Default channel name shared by every backend.
pub const DEFAULT_CHANNEL: &str = "market:ticks";

// =============================================================================
// In-Process Bus
// =============================================================================

/// Configuration for the in-process channel.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Events buffered per subscriber before it starts lagging.
    pub capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { capacity: 10_000 }
    }
}

/// Tick bus backed by a tokio broadcast channel.
///
/// # Example
///
/// ```rust
/// use market_stream_hub::infrastructure::broadcast::{BroadcastConfig, InProcessTickBus};
///
/// let bus = InProcessTickBus::new(BroadcastConfig::default());
/// assert_eq!(bus.receiver_count(), 0);
/// ```
#[derive(Debug)]
pub struct InProcessTickBus {
    tx: broadcast::Sender<TickEvent>,
}

impl InProcessTickBus {
    /// Create a new in-process bus.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            tx: broadcast::channel(config.capacity.max(1)).0,
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl TickBus for InProcessTickBus {
    async fn publish(&self, event: &TickEvent) -> Result<(), BusError> {
        // Zero receivers is not an error.
        let _ = self.tx.send(event.clone());
        Ok(())
    }

    async fn subscribe(&self) -> Result<TickStream, BusError> {
        let stream = BroadcastStream::new(self.tx.subscribe()).filter_map(|item| async move {
            match item {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Broadcast subscriber lagged, skipping events");
                    None
                }
            }
        });
        Ok(stream.boxed())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Tick;

    fn event(symbol: &str, price: f64) -> TickEvent {
        TickEvent::new(
            symbol,
            Tick {
                symbol: symbol.to_string(),
                price,
                ..Tick::default()
            },
        )
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = InProcessTickBus::new(BroadcastConfig::default());
        assert!(bus.publish(&event("TCS.NS", 1.0)).await.is_ok());
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event_in_order() {
        let bus = InProcessTickBus::new(BroadcastConfig::default());
        let mut a = bus.subscribe().await.unwrap();
        let mut b = bus.subscribe().await.unwrap();
        assert_eq!(bus.receiver_count(), 2);

        bus.publish(&event("TCS.NS", 1.0)).await.unwrap();
        bus.publish(&event("TCS.NS", 2.0)).await.unwrap();

        assert_eq!(a.next().await.unwrap().data.price, 1.0);
        assert_eq!(a.next().await.unwrap().data.price, 2.0);
        assert_eq!(b.next().await.unwrap().data.price, 1.0);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_ahead() {
        let bus = InProcessTickBus::new(BroadcastConfig { capacity: 2 });
        let mut stream = bus.subscribe().await.unwrap();

        for price in 1..=5 {
            bus.publish(&event("TCS.NS", f64::from(price))).await.unwrap();
        }

        assert_eq!(stream.next().await.unwrap().data.price, 4.0);
        assert_eq!(stream.next().await.unwrap().data.price, 5.0);
    }

    #[tokio::test]
    async fn receiver_count_drops_with_stream() {
        let bus = InProcessTickBus::new(BroadcastConfig::default());
        {
            let _stream = bus.subscribe().await.unwrap();
            assert_eq!(bus.receiver_count(), 1);
        }
        assert_eq!(bus.receiver_count(), 0);
    }
}
