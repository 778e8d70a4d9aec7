//! Yahoo Finance response bodies.
//!
//! Only the fields the adapter reads are modelled; everything else is
//! ignored by serde.

use serde::Deserialize;

use crate::application::ports::{ChartBar, ProviderQuote, SearchQuote};

// =============================================================================
// Quote
// =============================================================================

/// `GET /v7/finance/quote`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteEnvelope {
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub result: Vec<ProviderQuote>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

// =============================================================================
// Chart
// =============================================================================

/// `GET /v8/finance/chart/{symbol}`
#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

/// Column-oriented OHLCV, parallel to `timestamp`.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteIndicator {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zip the columns into rows. Short columns read as missing values.
    pub fn bars(&self) -> Vec<ChartBar> {
        let empty = QuoteIndicator::default();
        let columns = self.indicators.quote.first().unwrap_or(&empty);
        let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| ChartBar {
                timestamp,
                open: at(&columns.open, i),
                high: at(&columns.high, i),
                low: at(&columns.low, i),
                close: at(&columns.close, i),
                volume: at(&columns.volume, i).and_then(to_volume),
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_volume(raw: f64) -> Option<u64> {
    (raw.is_finite() && raw >= 0.0).then(|| raw as u64)
}

// =============================================================================
// Search
// =============================================================================

/// `GET /v1/finance/search`
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub quotes: Vec<SearchQuote>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error object embedded in quote and chart bodies.
#[derive(Debug, Clone, Deserialize)]
pub struct YahooError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl YahooError {
    /// Whether the error means the symbol does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
            || self.description.contains("No data found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_columns_zip_into_bars() {
        let envelope: ChartEnvelope = serde_json::from_str(
            r#"{"chart":{"result":[{"meta":{"symbol":"TCS.NS"},
                "timestamp":[1700000000,1700000060],
                "indicators":{"quote":[{"open":[10.0,null],"high":[11.0,12.0],
                "low":[9.5],"close":[10.5,11.5],"volume":[1200,null]}]}}],"error":null}}"#,
        )
        .unwrap();

        let result = &envelope.chart.result.unwrap()[0];
        let bars = result.bars();

        assert_eq!(result.meta.symbol, "TCS.NS");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, Some(1200));
        assert_eq!(bars[1].open, None);
        assert_eq!(bars[1].low, None);
        assert_eq!(bars[1].close, Some(11.5));
    }

    #[test]
    fn chart_without_indicators_has_empty_bars() {
        let envelope: ChartEnvelope = serde_json::from_str(
            r#"{"chart":{"result":[{"meta":{"symbol":"X"},"timestamp":[1]}]}}"#,
        )
        .unwrap();

        let bars = envelope.chart.result.unwrap()[0].bars();

        assert_eq!(bars.len(), 1);
        assert!(bars[0].close.is_none());
    }

    #[test]
    fn not_found_error_is_recognised() {
        let error = YahooError {
            code: "Not Found".to_string(),
            description: "No data found, symbol may be delisted".to_string(),
        };
        assert!(error.is_not_found());
    }
}
