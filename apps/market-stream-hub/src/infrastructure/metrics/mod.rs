//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Feed**: Frames received, decoded and dropped; connection state; reconnects
//! - **Relay**: Ticks published to the broadcast channel or delivered locally
//! - **Clients**: Connections, rooms, ticks delivered and dropped
//! - **Dependencies**: Cache and provider failures
//! - **Latency**: Per-frame processing time
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if another global recorder is already installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Feed
    describe_counter!(
        "market_hub_frames_received_total",
        "Total frames received from the upstream feed"
    );
    describe_counter!(
        "market_hub_frames_processed_total",
        "Frames processed by outcome"
    );
    describe_gauge!(
        "market_hub_feed_connected",
        "Whether the upstream feed connection is up (1) or down (0)"
    );
    describe_counter!(
        "market_hub_feed_errors_total",
        "Upstream feed errors by type"
    );
    describe_counter!(
        "market_hub_reconnects_total",
        "Total upstream reconnection attempts"
    );

    // Relay
    describe_counter!(
        "market_hub_ticks_published_total",
        "Ticks published to the broadcast channel"
    );
    describe_counter!(
        "market_hub_ticks_relayed_locally_total",
        "Ticks delivered in-process after a failed publish"
    );

    // Clients
    describe_gauge!(
        "market_hub_client_connections",
        "Number of connected WebSocket clients"
    );
    describe_gauge!("market_hub_rooms", "Number of non-empty symbol rooms");
    describe_counter!(
        "market_hub_client_messages_delivered_total",
        "Ticks enqueued to client connections"
    );
    describe_counter!(
        "market_hub_client_messages_dropped_total",
        "Ticks dropped for client connections by reason"
    );

    // Dependencies
    describe_counter!(
        "market_hub_cache_errors_total",
        "Cache backend failures absorbed as misses, by operation"
    );
    describe_counter!(
        "market_hub_provider_errors_total",
        "Market data provider failures by operation"
    );

    // Latency
    describe_histogram!(
        "market_hub_frame_processing_seconds",
        "Time from frame receipt to relay completion"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Outcome of processing one upstream frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Decoded into a tick and relayed.
    Decoded,
    /// Well-formed envelope but no tick inside.
    Dropped,
    /// Could not be unwrapped.
    Malformed,
}

impl FrameOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Decoded => "decoded",
            Self::Dropped => "dropped",
            Self::Malformed => "malformed",
        }
    }
}

/// Record a frame received from the upstream feed.
pub fn record_frame_received() {
    counter!("market_hub_frames_received_total").increment(1);
}

/// Record how a frame was handled.
pub fn record_frame_outcome(outcome: FrameOutcome) {
    counter!(
        "market_hub_frames_processed_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Update the upstream connection gauge.
pub fn set_feed_connected(connected: bool) {
    gauge!("market_hub_feed_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record an upstream feed error.
pub fn record_feed_error(error_type: &str) {
    counter!(
        "market_hub_feed_errors_total",
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

/// Record an upstream reconnection attempt.
pub fn record_reconnect() {
    counter!("market_hub_reconnects_total").increment(1);
}

/// Record a tick published to the broadcast channel.
pub fn record_tick_published() {
    counter!("market_hub_ticks_published_total").increment(1);
}

/// Record a tick delivered in-process after a failed publish.
pub fn record_tick_relayed_locally() {
    counter!("market_hub_ticks_relayed_locally_total").increment(1);
}

/// Update the client connection gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_client_connections(count: usize) {
    gauge!("market_hub_client_connections").set(count as f64);
}

/// Update the room gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_active_rooms(count: usize) {
    gauge!("market_hub_rooms").set(count as f64);
}

/// Record a tick enqueued to a client.
pub fn record_client_message_delivered() {
    counter!("market_hub_client_messages_delivered_total").increment(1);
}

/// Record a tick dropped for a client.
pub fn record_client_message_dropped(reason: &'static str) {
    counter!(
        "market_hub_client_messages_dropped_total",
        "reason" => reason
    )
    .increment(1);
}

/// Record a cache failure absorbed by the fail-open adapter.
pub fn record_cache_error(operation: &'static str) {
    counter!(
        "market_hub_cache_errors_total",
        "operation" => operation
    )
    .increment(1);
}

/// Record a market data provider failure.
pub fn record_provider_error(operation: &'static str) {
    counter!(
        "market_hub_provider_errors_total",
        "operation" => operation
    )
    .increment(1);
}

/// Record frame processing duration.
pub fn record_frame_processing(duration: Duration) {
    histogram!("market_hub_frame_processing_seconds").record(duration.as_secs_f64());
}

// =============================================================================
// Tests
// =============================================================================
