//! Market Data Port (Driven Port)
//!
//! Interface for fetching quotes, chart bars and symbol search results from
//! an external market-data provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::market::period::Interval;

/// Live quote as reported by the provider. Every field but the symbol may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQuote {
    /// Provider symbol.
    #[serde(default)]
    pub symbol: String,
    /// Short display name.
    pub short_name: Option<String>,
    /// Long display name.
    pub long_name: Option<String>,
    /// Regular market price.
    pub regular_market_price: Option<f64>,
    /// Change from previous close.
    pub regular_market_change: Option<f64>,
    /// Percent change from previous close.
    pub regular_market_change_percent: Option<f64>,
    /// Market capitalisation.
    pub market_cap: Option<f64>,
    /// Day volume.
    pub regular_market_volume: Option<f64>,
    /// Day high.
    pub regular_market_day_high: Option<f64>,
    /// Day low.
    pub regular_market_day_low: Option<f64>,
    /// Previous close.
    pub regular_market_previous_close: Option<f64>,
    /// Day open.
    pub regular_market_open: Option<f64>,
    /// 52-week high.
    pub fifty_two_week_high: Option<f64>,
    /// 52-week low.
    pub fifty_two_week_low: Option<f64>,
    /// Trading currency.
    pub currency: Option<String>,
}

/// Parameters of a chart request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    /// Window start.
    pub period1: DateTime<Utc>,
    /// Window end.
    pub period2: DateTime<Utc>,
    /// Bar width.
    pub interval: Interval,
}

/// One raw bar. Any price may be missing for halted or partial periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartBar {
    /// Bar start, epoch seconds.
    pub timestamp: i64,
    /// Open.
    pub open: Option<f64>,
    /// High.
    pub high: Option<f64>,
    /// Low.
    pub low: Option<f64>,
    /// Close.
    pub close: Option<f64>,
    /// Volume.
    pub volume: Option<u64>,
}

/// Chart response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    /// Provider symbol.
    pub symbol: String,
    /// Bars in provider order.
    pub bars: Vec<ChartBar>,
}

/// One search hit as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuote {
    /// Provider symbol.
    #[serde(default)]
    pub symbol: String,
    /// Short display name.
    #[serde(default)]
    pub shortname: Option<String>,
    /// Long display name.
    #[serde(default)]
    pub longname: Option<String>,
    /// Instrument type (`EQUITY`, `ETF`, `INDEX`, ...).
    #[serde(default, rename = "quoteType")]
    pub quote_type: Option<String>,
    /// Exchange code.
    #[serde(default)]
    pub exchange: Option<String>,
    /// Exchange display name.
    #[serde(default, rename = "exchDisp")]
    pub exch_disp: Option<String>,
}

impl SearchQuote {
    /// Whether this hit is a listed equity.
    #[must_use]
    pub fn is_equity(&self) -> bool {
        !self.symbol.is_empty() && self.quote_type.as_deref() == Some("EQUITY")
    }

    /// Short name, else long name, else the symbol.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.shortname
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.longname.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(self.symbol.as_str())
    }

    /// Exchange display name, else exchange code.
    #[must_use]
    pub fn exchange_name(&self) -> &str {
        self.exch_disp
            .as_deref()
            .or(self.exchange.as_deref())
            .unwrap_or_default()
    }
}

/// Market data provider error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure.
    #[error("provider connection error: {message}")]
    Connection {
        /// Error details.
        message: String,
    },

    /// Symbol unknown to the provider.
    #[error("symbol not found: {symbol}")]
    SymbolNotFound {
        /// The unknown symbol.
        symbol: String,
    },

    /// Provider returned an error status or error body.
    #[error("provider API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("provider response parse error: {0}")]
    Parse(String),

    /// Rate limited.
    #[error("provider rate limited")]
    RateLimited,
}

/// Port for on-demand market data lookups.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Live quote for one symbol.
    async fn quote(&self, symbol: &str) -> Result<ProviderQuote, ProviderError>;

    /// OHLCV bars for one symbol over a window.
    async fn chart(&self, symbol: &str, request: ChartRequest) -> Result<ChartData, ProviderError>;

    /// Free-text symbol search.
    async fn search(&self, term: &str) -> Result<Vec<SearchQuote>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_quote_deserializes_provider_names() {
        let hit: SearchQuote = serde_json::from_str(
            r#"{"symbol":"TCS.NS","shortname":"TATA CONSULTANCY","quoteType":"EQUITY","exchange":"NSI","exchDisp":"NSE"}"#,
        )
        .unwrap();

        assert!(hit.is_equity());
        assert_eq!(hit.display_name(), "TATA CONSULTANCY");
        assert_eq!(hit.exchange_name(), "NSE");
    }

    #[test]
    fn search_quote_name_fallbacks() {
        let hit = SearchQuote {
            symbol: "XYZ".to_string(),
            longname: Some("Xyz Holdings".to_string()),
            exchange: Some("NMS".to_string()),
            ..SearchQuote::default()
        };
        assert_eq!(hit.display_name(), "Xyz Holdings");
        assert_eq!(hit.exchange_name(), "NMS");
        assert!(!hit.is_equity());

        let bare = SearchQuote {
            symbol: "XYZ".to_string(),
            ..SearchQuote::default()
        };
        assert_eq!(bare.display_name(), "XYZ");
    }

    #[test]
    fn provider_quote_reads_camel_case() {
        let quote: ProviderQuote = serde_json::from_str(
            r#"{"symbol":"INFY.NS","regularMarketPrice":1500.5,"marketCap":6.2e12,"currency":"INR"}"#,
        )
        .unwrap();
        assert_eq!(quote.regular_market_price, Some(1500.5));
        assert_eq!(quote.market_cap, Some(6.2e12));
        assert!(quote.short_name.is_none());
    }
}
