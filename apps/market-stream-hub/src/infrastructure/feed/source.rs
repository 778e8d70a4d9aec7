//! Tick Source
//!
//! Holds the single outbound connection to the upstream streamer.
//!
//! # Lifecycle
//!
//! 1. Connect and send `{"subscribe":[...]}` for the whole interest set.
//! 2. Decode each inbound frame and await the sink before reading the next.
//! 3. On any close or error, wait out the [`ReconnectStrategy`] delay and
//!    start again at 1.
//!
//! Interest changes made while connected go out immediately; changes made
//! while disconnected are folded into the next connect.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FeedInterest, TickSink};
use crate::domain::market::symbol::canonicalize;
use crate::infrastructure::metrics::{self, FrameOutcome};

use super::codec::{self, DecodeError};
use super::heartbeat::{HeartbeatConfig, HeartbeatEvent, HeartbeatManager, HeartbeatState};
use super::messages::FeedRequest;
use super::reconnect::{ReconnectSettings, ReconnectStrategy};
use super::state::{ConnectionState, FeedState};

/// Default upstream streamer URL.
pub const DEFAULT_FEED_URL: &str = "wss://streamer.finance.yahoo.com";

// =============================================================================
// Error Type
// =============================================================================

/// Errors that end one connection. All of them lead to a reconnect.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// WebSocket transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Request could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No inbound traffic within the idle timeout.
    #[error("heartbeat timeout")]
    HeartbeatTimeout,

    /// Upstream closed the connection.
    #[error("connection closed")]
    ConnectionClosed,

    /// The reconnect strategy gave up.
    #[error("maximum reconnection attempts exceeded")]
    MaxReconnectAttemptsExceeded,
}

impl FeedError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WebSocket(_) => "websocket",
            Self::Serialization(_) => "serialization",
            Self::HeartbeatTimeout => "heartbeat_timeout",
            Self::ConnectionClosed => "closed",
            Self::MaxReconnectAttemptsExceeded => "max_attempts",
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Tick source configuration.
#[derive(Debug, Clone)]
pub struct TickSourceConfig {
    /// Upstream WebSocket URL.
    pub url: String,
    /// Symbols streamed from the start.
    pub symbols: Vec<String>,
    /// Reconnect behaviour.
    pub reconnect: ReconnectSettings,
    /// Keep-alive timing.
    pub heartbeat: HeartbeatConfig,
}

impl Default for TickSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            symbols: Vec::new(),
            reconnect: ReconnectSettings::default(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

// =============================================================================
// Tick Source
// =============================================================================

/// Upstream tick source.
pub struct TickSource {
    config: TickSourceConfig,
    sink: Arc<dyn TickSink>,
    interest: RwLock<BTreeSet<String>>,
    live: Mutex<Option<mpsc::UnboundedSender<FeedRequest>>>,
    state: Arc<FeedState>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for TickSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickSource")
            .field("url", &self.config.url)
            .field("interest", &*self.interest.read())
            .field("state", &self.state.get_state())
            .finish_non_exhaustive()
    }
}

impl TickSource {
    /// Create a source delivering into `sink`.
    #[must_use]
    pub fn new(config: TickSourceConfig, sink: Arc<dyn TickSink>) -> Self {
        let interest = config
            .symbols
            .iter()
            .map(|s| canonicalize(s))
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            config,
            sink,
            interest: RwLock::new(interest),
            live: Mutex::new(None),
            state: Arc::new(FeedState::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Shared connection state.
    #[must_use]
    pub fn state(&self) -> Arc<FeedState> {
        Arc::clone(&self.state)
    }

    /// Current interest set, sorted.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.interest.read().iter().cloned().collect()
    }

    /// Spawn the connection loop.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let source = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = source.run().await {
                tracing::error!(error = %e, "Tick source stopped");
            }
        })
    }

    /// Stop the connection loop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Connection loop. Returns when stopped or the strategy gives up.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MaxReconnectAttemptsExceeded`] when the reconnect
    /// strategy refuses another attempt.
    pub async fn run(&self) -> Result<(), FeedError> {
        let mut strategy = self.config.reconnect.build();

        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }

            self.state.set_state(ConnectionState::Connecting);
            match self.connect_and_run(strategy.as_mut()).await {
                Ok(()) => break Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Feed connection lost");
                    metrics::record_feed_error(e.kind());
                    self.state.set_error(e.to_string());

                    let Some(delay) = strategy.next_delay() else {
                        break Err(FeedError::MaxReconnectAttemptsExceeded);
                    };
                    self.state.set_state(ConnectionState::Reconnecting);
                    self.state.increment_reconnect_attempts();
                    metrics::record_reconnect();
                    tracing::info!(
                        attempt = strategy.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Reconnecting to feed"
                    );

                    tokio::select! {
                        () = self.cancel.cancelled() => break Ok(()),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        };

        self.state.set_state(ConnectionState::Disconnected);
        tracing::info!("Feed loop exited");
        result
    }

    /// One connection, from dial to close. `Ok` only on cancellation.
    async fn connect_and_run(&self, strategy: &mut dyn ReconnectStrategy) -> Result<(), FeedError> {
        tracing::info!(url = %self.config.url, "Connecting to feed");
        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        self.state.set_state(ConnectionState::Connected);
        metrics::set_feed_connected(true);
        strategy.reset();

        let (request_tx, mut request_rx) = mpsc::unbounded_channel();
        let initial: Vec<String> = {
            let interest = self.interest.read();
            *self.live.lock() = Some(request_tx);
            interest.iter().cloned().collect()
        };
        tracing::info!(symbols = initial.len(), "Feed connected");

        let heartbeat_state = Arc::new(HeartbeatState::new());
        let (heartbeat_tx, mut heartbeat_rx) = mpsc::channel(10);
        let heartbeat_cancel = self.cancel.child_token();
        tokio::spawn(
            HeartbeatManager::new(
                self.config.heartbeat.clone(),
                Arc::clone(&heartbeat_state),
                heartbeat_tx,
                heartbeat_cancel.clone(),
            )
            .run(),
        );

        let result = async {
            if !initial.is_empty() {
                send_request(&mut write, &FeedRequest::Subscribe(initial)).await?;
            }
            self.pump(
                &mut write,
                &mut read,
                &mut request_rx,
                &mut heartbeat_rx,
                &heartbeat_state,
            )
            .await
        }
        .await;

        *self.live.lock() = None;
        heartbeat_cancel.cancel();
        metrics::set_feed_connected(false);
        result
    }

    async fn pump<W, R>(
        &self,
        write: &mut W,
        read: &mut R,
        requests: &mut mpsc::UnboundedReceiver<FeedRequest>,
        heartbeat: &mut mpsc::Receiver<HeartbeatEvent>,
        activity: &HeartbeatState,
    ) -> Result<(), FeedError>
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
        R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }

                Some(request) = requests.recv() => {
                    send_request(write, &request).await?;
                }

                Some(event) = heartbeat.recv() => match event {
                    HeartbeatEvent::SendPing => {
                        write.send(Message::Ping(vec![].into())).await?;
                    }
                    HeartbeatEvent::Timeout => return Err(FeedError::HeartbeatTimeout),
                },

                msg = read.next() => {
                    activity.record_activity();
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()).await,
                        Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                            Ok(text) => self.handle_frame(text).await,
                            Err(_) => {
                                self.state.increment_messages();
                                metrics::record_frame_received();
                                metrics::record_frame_outcome(FrameOutcome::Malformed);
                                tracing::debug!(len = bytes.len(), "Dropping non-UTF-8 binary frame");
                            }
                        },
                        Some(Ok(Message::Ping(data))) => write.send(Message::Pong(data)).await?,
                        Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Feed closed by upstream");
                            return Err(FeedError::ConnectionClosed);
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(FeedError::ConnectionClosed),
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) {
        let started = Instant::now();
        self.state.increment_messages();
        metrics::record_frame_received();

        match codec::decode_frame(text) {
            Ok(mut tick) => {
                if tick.time == 0 {
                    tick.time = Utc::now().timestamp_millis();
                }
                let symbol = tick.symbol.clone();
                self.sink.on_tick(&symbol, tick).await;
                metrics::record_frame_outcome(FrameOutcome::Decoded);
                metrics::record_frame_processing(started.elapsed());
            }
            Err(e) => {
                let outcome = if e.is_malformed_wrapper() {
                    FrameOutcome::Malformed
                } else {
                    FrameOutcome::Dropped
                };
                metrics::record_frame_outcome(outcome);
                log_decode_error(&e);
            }
        }
    }

    fn push(&self, request: FeedRequest) {
        if let Some(tx) = self.live.lock().as_ref() {
            tracing::debug!(?request, "Pushing interest update");
            let _ = tx.send(request);
        }
    }
}

impl FeedInterest for TickSource {
    fn subscribe(&self, symbols: &[String]) {
        let mut interest = self.interest.write();
        let added: Vec<String> = symbols
            .iter()
            .map(|s| canonicalize(s))
            .filter(|s| !s.is_empty() && interest.insert(s.clone()))
            .collect();
        if !added.is_empty() {
            self.push(FeedRequest::Subscribe(added));
        }
    }

    fn unsubscribe(&self, symbols: &[String]) {
        let mut interest = self.interest.write();
        let removed: Vec<String> = symbols
            .iter()
            .map(|s| canonicalize(s))
            .filter(|s| interest.remove(s))
            .collect();
        if !removed.is_empty() {
            self.push(FeedRequest::Unsubscribe(removed));
        }
    }
}

async fn send_request<W>(write: &mut W, request: &FeedRequest) -> Result<(), FeedError>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let json = serde_json::to_string(request)?;
    write.send(Message::Text(json.into())).await?;
    Ok(())
}

fn log_decode_error(error: &DecodeError) {
    match error {
        DecodeError::MissingSymbol | DecodeError::MissingPrice => {
            tracing::trace!(error = %error, "Frame carried no tick");
        }
        _ => tracing::debug!(error = %error, "Dropping undecodable frame"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Tick;

    struct NullSink;

    #[async_trait::async_trait]
    impl TickSink for NullSink {
        async fn on_tick(&self, _symbol: &str, _tick: Tick) {}
    }

    fn source(symbols: &[&str]) -> TickSource {
        TickSource::new(
            TickSourceConfig {
                symbols: symbols.iter().map(ToString::to_string).collect(),
                ..TickSourceConfig::default()
            },
            Arc::new(NullSink),
        )
    }

    fn owned(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn initial_symbols_are_canonical_and_deduplicated() {
        let source = source(&["tcs.ns", "TCS.NS", " infy.ns ", ""]);
        assert_eq!(source.symbols(), owned(&["INFY.NS", "TCS.NS"]));
    }

    #[test]
    fn interest_changes_while_disconnected_are_kept() {
        let source = source(&["TCS.NS"]);

        source.subscribe(&owned(&["ITC.NS"]));
        source.unsubscribe(&owned(&["TCS.NS"]));

        assert_eq!(source.symbols(), owned(&["ITC.NS"]));
        assert_eq!(source.state().get_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn live_connection_receives_only_changes() {
        let source = source(&["TCS.NS"]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        *source.live.lock() = Some(tx);

        source.subscribe(&owned(&["TCS.NS", "SBIN.NS"]));
        source.unsubscribe(&owned(&["WIPRO.NS"]));
        source.unsubscribe(&owned(&["TCS.NS"]));

        assert_eq!(rx.try_recv().unwrap(), FeedRequest::Subscribe(owned(&["SBIN.NS"])));
        assert_eq!(rx.try_recv().unwrap(), FeedRequest::Unsubscribe(owned(&["TCS.NS"])));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_before_start_ends_immediately() {
        let source = Arc::new(source(&["TCS.NS"]));
        source.stop();

        let handle = source.start();

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(source.state().get_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(FeedError::HeartbeatTimeout.kind(), "heartbeat_timeout");
        assert_eq!(FeedError::ConnectionClosed.kind(), "closed");
    }
}
