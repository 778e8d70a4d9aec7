//! Feed Ports
//!
//! Seams between the upstream tick source, the relay and the hub.

use async_trait::async_trait;

use crate::domain::market::{Tick, TickEvent};

/// Receives decoded ticks from the feed, one at a time in arrival order.
#[async_trait]
pub trait TickSink: Send + Sync {
    /// Handle one tick. Must not fail; errors are absorbed by the sink.
    async fn on_tick(&self, symbol: &str, tick: Tick);
}

/// Upstream interest control. Calls never block on the network.
pub trait FeedInterest: Send + Sync {
    /// Add symbols to the upstream interest set.
    fn subscribe(&self, symbols: &[String]);

    /// Remove symbols from the upstream interest set.
    fn unsubscribe(&self, symbols: &[String]);
}

/// Direct in-process fan-out, bypassing the broadcast channel.
pub trait LocalDelivery: Send + Sync {
    /// Deliver to local members of `event.symbol`. Returns deliveries made.
    fn deliver_local(&self, event: &TickEvent) -> usize;
}
