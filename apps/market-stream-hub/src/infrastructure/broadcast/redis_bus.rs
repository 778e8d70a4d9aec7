//! Redis pub/sub tick bus.
//!
//! Events travel as JSON `{"symbol": ..., "data": {...}}` on one channel.
//! Each [`TickBus::subscribe`] call opens its own pub/sub connection; the
//! returned stream ends when that connection drops.

use async_trait::async_trait;
use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::application::ports::{BusError, TickBus, TickStream};
use crate::domain::market::TickEvent;

/// Tick bus over Redis pub/sub.
#[derive(Clone)]
pub struct RedisTickBus {
    client: redis::Client,
    publisher: ConnectionManager,
    channel: String,
}

impl std::fmt::Debug for RedisTickBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisTickBus")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

impl RedisTickBus {
    /// Connect the publisher side.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unavailable`] if the URL is invalid or Redis is
    /// unreachable.
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self, BusError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let publisher = ConnectionManager::new(client.clone())
            .await
            .map_err(unavailable)?;
        let channel = channel.into();
        tracing::info!(channel = %channel, "Connected to Redis tick bus");
        Ok(Self {
            client,
            publisher,
            channel,
        })
    }

    /// Channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

fn unavailable(e: redis::RedisError) -> BusError {
    BusError::Unavailable(e.to_string())
}

fn decode(payload: &str) -> Option<TickEvent> {
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "Dropping undecodable bus message");
            None
        }
    }
}

#[async_trait]
impl TickBus for RedisTickBus {
    async fn publish(&self, event: &TickEvent) -> Result<(), BusError> {
        let payload =
            serde_json::to_string(event).map_err(|e| BusError::Serialization(e.to_string()))?;
        let mut conn = self.publisher.clone();
        conn.publish::<_, _, i64>(&self.channel, payload)
            .await
            .map(|_| ())
            .map_err(|e| BusError::PublishFailed(e.to_string()))
    }

    async fn subscribe(&self) -> Result<TickStream, BusError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(unavailable)?;
        pubsub
            .subscribe(&self.channel)
            .await
            .map_err(unavailable)?;
        tracing::debug!(channel = %self.channel, "Subscribed to Redis tick bus");

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            decode(&payload)
        });
        Ok(stream.boxed())
    }
}
