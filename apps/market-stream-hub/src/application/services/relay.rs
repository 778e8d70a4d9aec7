//! Tick Relay
//!
//! Sits between the feed and the hub. Each tick is stored as the latest
//! value for its symbol, then published on the broadcast channel. When the
//! channel rejects a publish, the tick is handed straight to local
//! subscribers instead.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{LocalDelivery, TickBus, TickSink};
use crate::domain::market::symbol::tick_key;
use crate::domain::market::{Tick, TickEvent};
use crate::infrastructure::metrics;

use super::FailOpenCache;

/// Lifetime of the latest-tick entry.
const TICK_TTL: Duration = Duration::from_secs(300);

/// Persists and publishes live ticks.
pub struct TickRelay {
    cache: Arc<FailOpenCache>,
    bus: Arc<dyn TickBus>,
    local: OnceLock<Arc<dyn LocalDelivery>>,
}

impl TickRelay {
    /// Create a relay without a local fallback.
    #[must_use]
    pub fn new(cache: Arc<FailOpenCache>, bus: Arc<dyn TickBus>) -> Self {
        Self {
            cache,
            bus,
            local: OnceLock::new(),
        }
    }

    /// Deliver directly to in-process subscribers when publishing fails.
    #[must_use]
    pub fn with_local_fallback(self, local: Arc<dyn LocalDelivery>) -> Self {
        self.set_local_fallback(local);
        self
    }

    /// Attach the local fallback after construction, once the hub exists.
    /// Later calls are ignored.
    pub fn set_local_fallback(&self, local: Arc<dyn LocalDelivery>) {
        if self.local.set(local).is_err() {
            tracing::debug!("Local fallback already attached");
        }
    }

    /// Store the tick, then broadcast it.
    pub async fn send_tick(&self, symbol: &str, tick: Tick) {
        self.cache.set_json(&tick_key(symbol), &tick, TICK_TTL).await;

        let event = TickEvent::new(symbol, tick);
        match self.bus.publish(&event).await {
            Ok(()) => metrics::record_tick_published(),
            Err(e) => {
                let delivered = self
                    .local
                    .get()
                    .map_or(0, |local| local.deliver_local(&event));
                metrics::record_tick_relayed_locally();
                tracing::warn!(
                    symbol,
                    error = %e,
                    delivered,
                    "Publish failed, delivered to local subscribers"
                );
            }
        }
    }
}

#[async_trait]
impl TickSink for TickRelay {
    async fn on_tick(&self, symbol: &str, tick: Tick) {
        self.send_tick(symbol, tick).await;
    }
}
