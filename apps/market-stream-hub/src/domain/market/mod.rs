//! Market Data Types
//!
//! Records that flow through the hub: live ticks from the upstream feed,
//! quote snapshots, OHLCV candles, search results and exchange status.
//!
//! All records serialize with camelCase field names, which is the shape
//! stored in the shared cache and sent to WebSocket clients.

pub mod format;
pub mod period;
pub mod symbol;

use serde::{Deserialize, Serialize};

// =============================================================================
// Tick
// =============================================================================

/// Latest trade snapshot for one symbol, decoded from a feed frame.
///
/// Absent numeric fields are zero. `time` is epoch milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tick {
    /// Exchange-qualified symbol (e.g. `TCS.NS`).
    pub symbol: String,
    /// Last traded price.
    pub price: f64,
    /// Absolute change from previous close.
    pub change: f64,
    /// Percent change from previous close.
    pub change_percent: f64,
    /// Cumulative day volume.
    pub volume: u64,
    /// Session high.
    pub day_high: f64,
    /// Session low.
    pub day_low: f64,
    /// Trade time in epoch milliseconds.
    pub time: i64,
}

/// A tick as carried on the broadcast channel: `{symbol, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    /// Room the tick is addressed to.
    pub symbol: String,
    /// The tick payload.
    pub data: Tick,
}

impl TickEvent {
    /// Wrap a tick for publication under `symbol`.
    #[must_use]
    pub fn new(symbol: impl Into<String>, data: Tick) -> Self {
        Self {
            symbol: symbol.into(),
            data,
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Quote snapshot returned by the quote service.
///
/// `market_cap` and `volume` are display strings (`"15.00L"`, `"-"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Resolved symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Regular market price.
    pub price: Option<f64>,
    /// Change, rounded to 2 decimals.
    pub change: f64,
    /// Percent change, rounded to 2 decimals.
    pub change_percent: f64,
    /// Formatted market capitalisation.
    pub market_cap: String,
    /// Formatted day volume.
    pub volume: String,
    /// Day high.
    pub high: Option<f64>,
    /// Day low.
    pub low: Option<f64>,
    /// Previous close.
    pub prev_close: Option<f64>,
    /// Day open.
    pub open: Option<f64>,
    /// 52-week high.
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low.
    pub fifty_two_week_low: Option<f64>,
    /// Trading currency.
    pub currency: String,
}

// =============================================================================
// Candle
// =============================================================================

/// Candle timestamp: epoch seconds for intraday bars, a calendar date
/// (`YYYY-MM-DD`) for daily and coarser bars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandleTime {
    /// Epoch seconds.
    Epoch(i64),
    /// Exchange-local calendar date.
    Date(String),
}

/// One OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar time.
    pub time: CandleTime,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Volume traded during the bar.
    pub volume: u64,
}

// =============================================================================
// Search
// =============================================================================

/// A symbol search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Symbol as the caller should request it.
    pub symbol: String,
    /// Company name.
    pub name: String,
    /// Exchange display name.
    pub exchange: String,
    /// Sector, for entries from the local reference table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
}

// =============================================================================
// Market Status
// =============================================================================

/// Exchange open/closed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    /// Whether the exchange is in its regular session.
    pub is_open: bool,
    /// Exchange-local wall clock, `hh:mm AM`.
    pub current_time: String,
    /// Session open, `hh:mm AM`.
    pub open_time: String,
    /// Session close, `hh:mm PM`.
    pub close_time: String,
    /// Human-readable status.
    pub message: String,
    /// Whether this status was served from cache.
    #[serde(default)]
    pub cached: bool,
}
