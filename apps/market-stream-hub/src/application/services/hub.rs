//! Subscription Hub
//!
//! Owns client connections and their room membership, replays the latest
//! cached tick when a client joins a room, and fans ticks from the broadcast
//! channel out to the members of each symbol's room.
//!
//! # Delivery
//!
//! Each connection has a bounded outbound queue filled with `try_send`, so a
//! slow client only loses its own ticks. A single dispatcher task drains the
//! broadcast channel, which keeps per-symbol delivery in publish order.
//!
//! # Replay ordering
//!
//! A join marks `(conn, symbol)` as pending before the room is entered. While
//! pending, live ticks for that pair are buffered. Once the cache lookup
//! completes, the replayed tick is sent first and the buffer is flushed after
//! it under the same lock the dispatcher takes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedInterest, LocalDelivery, TickBus};
use crate::domain::market::symbol::{canonicalize, tick_key};
use crate::domain::market::{Tick, TickEvent};
use crate::domain::subscription::{ConnectionId, RoomTable, SubscriptionChanges};
use crate::infrastructure::metrics;

use super::FailOpenCache;

/// Hub tuning.
#[derive(Debug, Clone, Copy)]
pub struct HubSettings {
    /// Outbound queue capacity per connection.
    pub client_queue_capacity: usize,
    /// Skip replaying cached ticks older than this. `None` replays anything cached.
    pub replay_max_age: Option<Duration>,
    /// Pause before resubscribing after the channel stream ends.
    pub resubscribe_delay: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            client_queue_capacity: 256,
            replay_max_age: None,
            resubscribe_delay: Duration::from_secs(1),
        }
    }
}

/// Point-in-time hub counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Open client connections.
    pub connections: usize,
    /// Rooms with at least one member.
    pub rooms: usize,
}

/// Room-based fan-out of live ticks to client connections.
pub struct SubscriptionHub {
    settings: HubSettings,
    rooms: RoomTable,
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Tick>>>,
    pending: Mutex<HashMap<ConnectionId, HashMap<String, Vec<Tick>>>>,
    cache: Arc<FailOpenCache>,
    bus: Arc<dyn TickBus>,
    interest: Option<Arc<dyn FeedInterest>>,
    next_id: AtomicU64,
    cancel: CancellationToken,
}

impl SubscriptionHub {
    /// Create a hub reading from `bus` and replaying from `cache`.
    #[must_use]
    pub fn new(settings: HubSettings, cache: Arc<FailOpenCache>, bus: Arc<dyn TickBus>) -> Self {
        Self {
            settings,
            rooms: RoomTable::new(),
            connections: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            cache,
            bus,
            interest: None,
            next_id: AtomicU64::new(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Forward first-join and last-leave room changes upstream.
    #[must_use]
    pub fn with_feed_interest(mut self, interest: Arc<dyn FeedInterest>) -> Self {
        self.interest = Some(interest);
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawn the dispatcher task.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let hub = Arc::clone(self);
        tokio::spawn(async move { hub.run_dispatcher().await })
    }

    /// Stop the dispatcher.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    async fn run_dispatcher(&self) {
        tracing::info!("Subscription hub dispatcher started");
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.bus.subscribe().await {
                Ok(mut stream) => loop {
                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            tracing::info!("Subscription hub dispatcher stopped");
                            return;
                        }
                        next = stream.next() => match next {
                            Some(event) => {
                                self.dispatch(&event);
                            }
                            None => {
                                tracing::warn!("Broadcast stream ended, resubscribing");
                                break;
                            }
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to subscribe to broadcast channel");
                }
            }

            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(self.settings.resubscribe_delay) => {}
            }
        }
        tracing::info!("Subscription hub dispatcher stopped");
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// Register a client connection and return its outbound queue.
    pub fn connect(&self) -> (ConnectionId, mpsc::Receiver<Tick>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.settings.client_queue_capacity.max(1));
        self.connections.write().insert(id, tx);
        tracing::debug!(connection_id = id, "Client connected");
        self.update_gauges();
        (id, rx)
    }

    /// Drop a connection and leave every room it belonged to.
    pub fn disconnect(&self, conn: ConnectionId) {
        self.connections.write().remove(&conn);
        self.pending.lock().remove(&conn);
        let changes = self.rooms.disconnect(conn);
        self.forward(&changes);
        tracing::debug!(connection_id = conn, "Client disconnected");
        self.update_gauges();
    }

    /// Join `symbol`'s room and replay its latest cached tick.
    pub async fn join(&self, conn: ConnectionId, symbol: &str) {
        let symbol = canonicalize(symbol);
        if symbol.is_empty() || !self.connections.read().contains_key(&conn) {
            return;
        }

        self.pending
            .lock()
            .entry(conn)
            .or_default()
            .insert(symbol.clone(), Vec::new());

        let outcome = self.rooms.join(conn, &symbol);
        self.forward(&outcome.changes);
        if outcome.joined {
            tracing::debug!(connection_id = conn, symbol = %symbol, "Joined room");
            self.update_gauges();
        }

        let replay = self
            .cache
            .get_json::<Tick>(&tick_key(&symbol))
            .await
            .filter(|tick| self.is_fresh(tick));

        let mut pending = self.pending.lock();
        let buffered = pending
            .get_mut(&conn)
            .and_then(|rooms| rooms.remove(&symbol))
            .unwrap_or_default();
        if pending.get(&conn).is_some_and(HashMap::is_empty) {
            pending.remove(&conn);
        }

        if !self.connections.read().contains_key(&conn) {
            // Disconnected while the replay lookup was in flight.
            drop(pending);
            let changes = self.rooms.leave(conn, &symbol);
            self.forward(&changes);
            return;
        }
        if !self.rooms.is_member(conn, &symbol) {
            return;
        }
        if let Some(tick) = replay {
            tracing::debug!(connection_id = conn, symbol = %symbol, "Replaying cached tick");
            self.send_to(conn, tick);
        }
        for tick in buffered {
            self.send_to(conn, tick);
        }
    }

    /// Leave `symbol`'s room.
    pub fn leave(&self, conn: ConnectionId, symbol: &str) {
        let symbol = canonicalize(symbol);
        if let Some(rooms) = self.pending.lock().get_mut(&conn) {
            rooms.remove(&symbol);
        }
        let changes = self.rooms.leave(conn, &symbol);
        self.forward(&changes);
        self.update_gauges();
    }

    /// Symbols `conn` is currently joined to.
    #[must_use]
    pub fn connection_symbols(&self, conn: ConnectionId) -> Vec<String> {
        self.rooms.connection_symbols(conn)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.connections.read().len(),
            rooms: self.rooms.stats().room_count,
        }
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Deliver one event to every member of its room. Returns deliveries made.
    pub fn dispatch(&self, event: &TickEvent) -> usize {
        let members = self.rooms.members(&event.symbol);
        if members.is_empty() {
            return 0;
        }

        let mut delivered = 0;
        let mut pending = self.pending.lock();
        for conn in members {
            if let Some(buffer) = pending
                .get_mut(&conn)
                .and_then(|rooms| rooms.get_mut(event.symbol.as_str()))
            {
                if buffer.len() < self.settings.client_queue_capacity {
                    buffer.push(event.data.clone());
                }
                continue;
            }
            if self.send_to(conn, event.data.clone()) {
                delivered += 1;
            }
        }
        drop(pending);
        delivered
    }

    fn send_to(&self, conn: ConnectionId, tick: Tick) -> bool {
        let Some(tx) = self.connections.read().get(&conn).cloned() else {
            return false;
        };
        match tx.try_send(tick) {
            Ok(()) => {
                metrics::record_client_message_delivered();
                true
            }
            Err(TrySendError::Full(_)) => {
                metrics::record_client_message_dropped("queue_full");
                tracing::debug!(connection_id = conn, "Client queue full, dropping tick");
                false
            }
            Err(TrySendError::Closed(_)) => {
                metrics::record_client_message_dropped("closed");
                false
            }
        }
    }

    fn is_fresh(&self, tick: &Tick) -> bool {
        let Some(max_age) = self.settings.replay_max_age else {
            return true;
        };
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        Utc::now().timestamp_millis().saturating_sub(tick.time) <= max_age_ms
    }

    fn forward(&self, changes: &SubscriptionChanges) {
        let Some(interest) = &self.interest else {
            return;
        };
        if !changes.subscribe.is_empty() {
            let symbols: Vec<String> = changes.subscribe.iter().cloned().collect();
            interest.subscribe(&symbols);
        }
        if !changes.unsubscribe.is_empty() {
            let symbols: Vec<String> = changes.unsubscribe.iter().cloned().collect();
            interest.unsubscribe(&symbols);
        }
    }

    fn update_gauges(&self) {
        let stats = self.stats();
        metrics::set_client_connections(stats.connections);
        metrics::set_active_rooms(stats.rooms);
    }
}

impl LocalDelivery for SubscriptionHub {
    fn deliver_local(&self, event: &TickEvent) -> usize {
        self.dispatch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BusError, TickStream};
    use crate::infrastructure::cache::MemoryCache;
    use async_trait::async_trait;

    struct NoBus;

    #[async_trait]
    impl TickBus for NoBus {
        async fn publish(&self, _: &TickEvent) -> Result<(), BusError> {
            Ok(())
        }

        async fn subscribe(&self) -> Result<TickStream, BusError> {
            Err(BusError::Unavailable("none".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingInterest {
        subscribed: Mutex<Vec<String>>,
        unsubscribed: Mutex<Vec<String>>,
    }

    impl FeedInterest for RecordingInterest {
        fn subscribe(&self, symbols: &[String]) {
            self.subscribed.lock().extend_from_slice(symbols);
        }

        fn unsubscribe(&self, symbols: &[String]) {
            self.unsubscribed.lock().extend_from_slice(symbols);
        }
    }

    fn hub(settings: HubSettings) -> (SubscriptionHub, Arc<FailOpenCache>) {
        let cache = Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new())));
        (
            SubscriptionHub::new(settings, Arc::clone(&cache), Arc::new(NoBus)),
            cache,
        )
    }

    fn tick(symbol: &str, price: f64) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            price,
            time: Utc::now().timestamp_millis(),
            ..Tick::default()
        }
    }

    #[tokio::test]
    async fn join_replays_cached_tick() {
        let (hub, cache) = hub(HubSettings::default());
        cache
            .set_json("tick:TCS.NS", &tick("TCS.NS", 3500.0), Duration::from_secs(60))
            .await;
        let (conn, mut rx) = hub.connect();

        hub.join(conn, "tcs.ns").await;

        assert_eq!(rx.try_recv().unwrap().price, 3500.0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn join_without_cached_tick_sends_nothing() {
        let (hub, _) = hub(HubSettings::default());
        let (conn, mut rx) = hub.connect();

        hub.join(conn, "TCS.NS").await;

        assert!(rx.try_recv().is_err());
        assert_eq!(hub.connection_symbols(conn), vec!["TCS.NS".to_string()]);
    }

    #[tokio::test]
    async fn stale_replay_is_skipped() {
        let (hub, cache) = hub(HubSettings {
            replay_max_age: Some(Duration::from_secs(60)),
            ..HubSettings::default()
        });
        let mut old = tick("TCS.NS", 1.0);
        old.time -= 120_000;
        cache
            .set_json("tick:TCS.NS", &old, Duration::from_secs(60))
            .await;
        let (conn, mut rx) = hub.connect();

        hub.join(conn, "TCS.NS").await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_reaches_only_room_members() {
        let (hub, _) = hub(HubSettings::default());
        let (a, mut rx_a) = hub.connect();
        let (b, mut rx_b) = hub.connect();
        hub.join(a, "TCS.NS").await;
        hub.join(b, "INFY.NS").await;

        let delivered = hub.dispatch(&TickEvent::new("TCS.NS", tick("TCS.NS", 1.0)));

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_queue_drops_only_for_that_connection() {
        let (hub, _) = hub(HubSettings {
            client_queue_capacity: 1,
            ..HubSettings::default()
        });
        let (slow, mut rx_slow) = hub.connect();
        let (fast, mut rx_fast) = hub.connect();
        hub.join(slow, "TCS.NS").await;
        hub.join(fast, "TCS.NS").await;

        hub.dispatch(&TickEvent::new("TCS.NS", tick("TCS.NS", 1.0)));
        rx_fast.try_recv().unwrap();
        hub.dispatch(&TickEvent::new("TCS.NS", tick("TCS.NS", 2.0)));

        assert_eq!(rx_fast.try_recv().unwrap().price, 2.0);
        assert_eq!(rx_slow.try_recv().unwrap().price, 1.0);
        assert!(rx_slow.try_recv().is_err());
    }

    #[tokio::test]
    async fn room_changes_reach_feed_interest() {
        let cache = Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new())));
        let interest = Arc::new(RecordingInterest::default());
        let hub = SubscriptionHub::new(HubSettings::default(), cache, Arc::new(NoBus))
            .with_feed_interest(interest.clone());
        let (a, _rx_a) = hub.connect();
        let (b, _rx_b) = hub.connect();

        hub.join(a, "WIPRO.NS").await;
        hub.join(b, "WIPRO.NS").await;
        hub.leave(a, "WIPRO.NS");
        assert!(interest.unsubscribed.lock().is_empty());
        hub.disconnect(b);

        assert_eq!(*interest.subscribed.lock(), vec!["WIPRO.NS".to_string()]);
        assert_eq!(*interest.unsubscribed.lock(), vec!["WIPRO.NS".to_string()]);
        assert_eq!(hub.stats(), HubStats { connections: 1, rooms: 0 });

        hub.disconnect(a);
        assert_eq!(hub.stats(), HubStats::default());
    }

    #[tokio::test]
    async fn leave_stops_delivery() {
        let (hub, _) = hub(HubSettings::default());
        let (conn, mut rx) = hub.connect();
        hub.join(conn, "SBIN.NS").await;

        hub.leave(conn, "sbin.ns");
        hub.dispatch(&TickEvent::new("SBIN.NS", tick("SBIN.NS", 1.0)));

        let mut recv = tokio_test::task::spawn(rx.recv());
        tokio_test::assert_pending!(recv.poll());
        assert!(hub.connection_symbols(conn).is_empty());
    }

    #[tokio::test]
    async fn unknown_connection_cannot_join() {
        let (hub, _) = hub(HubSettings::default());

        hub.join(42, "TCS.NS").await;

        assert_eq!(hub.stats().rooms, 0);
    }
}
