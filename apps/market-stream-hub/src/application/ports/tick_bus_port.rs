//! Tick Bus Port (Driven Port)
//!
//! One logical broadcast channel carrying `{symbol, data}` tick events
//! between ingestion and fan-out, possibly across processes.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::market::TickEvent;

/// Stream of events from one bus subscription. Ends when the subscription drops.
pub type TickStream = BoxStream<'static, TickEvent>;

/// Broadcast channel error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BusError {
    /// Backend unreachable or the connection dropped.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// Event could not be encoded.
    #[error("bus serialization error: {0}")]
    Serialization(String),

    /// Publish was rejected by the backend.
    #[error("publish failed: {0}")]
    PublishFailed(String),
}

/// Port for the tick broadcast channel.
#[async_trait]
pub trait TickBus: Send + Sync {
    /// Publish one event to every subscriber.
    async fn publish(&self, event: &TickEvent) -> Result<(), BusError>;

    /// Open a new subscription.
    async fn subscribe(&self) -> Result<TickStream, BusError>;
}
