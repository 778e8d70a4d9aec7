//! Yahoo Finance Adapter
//!
//! REST implementation of [`MarketDataProvider`].
//!
//! # Endpoints
//!
//! - Quote: `GET /v7/finance/quote?symbols={symbol}`
//! - Chart: `GET /v8/finance/chart/{symbol}?period1&period2&interval`
//! - Search: `GET /v1/finance/search?q={term}`
//!
//! Request timeouts are owned by the HTTP client; the services above never
//! cancel an in-flight call.

mod api_types;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::application::ports::{
    ChartData, ChartRequest, MarketDataProvider, ProviderError, ProviderQuote, SearchQuote,
};

use api_types::{ChartEnvelope, QuoteEnvelope, SearchResponse, YahooError};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Browser-like agent; the API rejects requests without one.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) market-stream-hub";

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum search hits requested.
    pub search_count: u32,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            search_count: 10,
        }
    }
}

/// Yahoo Finance market data provider.
#[derive(Clone)]
pub struct YahooProvider {
    http_client: reqwest::Client,
    base_url: String,
    search_count: u32,
}

impl std::fmt::Debug for YahooProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl YahooProvider {
    /// Build the adapter and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Connection`] if the client cannot be built.
    pub fn new(config: &YahooConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Connection {
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_count: config.search_count,
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let invalid = || ProviderError::Connection {
            message: format!("invalid base URL: {}", self.base_url),
        };
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        symbol: &str,
    ) -> Result<T, ProviderError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(url = %url, "Provider request");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Connection {
                message: e.to_string(),
            })?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: s.as_u16(),
                    message: body,
                });
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

fn embedded_error(error: YahooError, symbol: &str) -> ProviderError {
    if error.is_not_found() {
        ProviderError::SymbolNotFound {
            symbol: symbol.to_string(),
        }
    } else {
        ProviderError::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("{}: {}", error.code, error.description),
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn quote(&self, symbol: &str) -> Result<ProviderQuote, ProviderError> {
        let envelope: QuoteEnvelope = self
            .get_json(
                &["v7", "finance", "quote"],
                &[("symbols", symbol.to_string())],
                symbol,
            )
            .await?;

        let response = envelope.quote_response;
        if let Some(error) = response.error {
            return Err(embedded_error(error, symbol));
        }
        response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    async fn chart(&self, symbol: &str, request: ChartRequest) -> Result<ChartData, ProviderError> {
        let envelope: ChartEnvelope = self
            .get_json(
                &["v8", "finance", "chart", symbol],
                &[
                    ("period1", request.period1.timestamp().to_string()),
                    ("period2", request.period2.timestamp().to_string()),
                    ("interval", request.interval.as_str().to_string()),
                ],
                symbol,
            )
            .await?;

        let chart = envelope.chart;
        if let Some(error) = chart.error {
            return Err(embedded_error(error, symbol));
        }
        let result = chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;

        let symbol = if result.meta.symbol.is_empty() {
            symbol.to_string()
        } else {
            result.meta.symbol.clone()
        };
        Ok(ChartData {
            symbol,
            bars: result.bars(),
        })
    }

    async fn search(&self, term: &str) -> Result<Vec<SearchQuote>, ProviderError> {
        let response: SearchResponse = self
            .get_json(
                &["v1", "finance", "search"],
                &[
                    ("q", term.to_string()),
                    ("quotesCount", self.search_count.to_string()),
                    ("newsCount", "0".to_string()),
                ],
                term,
            )
            .await?;
        Ok(response.quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::period::Interval;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider(server: &MockServer) -> YahooProvider {
        YahooProvider::new(&YahooConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(2),
            search_count: 10,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn quote_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7/finance/quote"))
            .and(query_param("symbols", "TCS.NS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quoteResponse": {
                    "result": [{
                        "symbol": "TCS.NS",
                        "shortName": "TATA CONSULTANCY",
                        "regularMarketPrice": 3512.25,
                        "currency": "INR"
                    }],
                    "error": null
                }
            })))
            .mount(&server)
            .await;

        let quote = provider(&server).await.quote("TCS.NS").await.unwrap();

        assert_eq!(quote.symbol, "TCS.NS");
        assert_eq!(quote.regular_market_price, Some(3512.25));
        assert_eq!(quote.currency.as_deref(), Some("INR"));
    }

    #[tokio::test]
    async fn empty_quote_result_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/v7/finance/quote"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"quoteResponse": {"result": [], "error": null}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server).await.quote("NOPE").await.unwrap_err();

        assert!(matches!(err, ProviderError::SymbolNotFound { symbol } if symbol == "NOPE"));
    }

    #[tokio::test]
    async fn rate_limit_and_server_errors_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(path("/v7/finance/quote"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(path("/v1/finance/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let provider = provider(&server).await;

        assert!(matches!(
            provider.quote("TCS.NS").await,
            Err(ProviderError::RateLimited)
        ));
        assert!(matches!(
            provider.search("tata").await,
            Err(ProviderError::Api { status: 503, message }) if message == "down"
        ));
    }

    #[tokio::test]
    async fn chart_sends_window_and_interval() {
        let server = MockServer::start().await;
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 6, 0, 0, 0).unwrap();
        Mock::given(path("/v8/finance/chart/RELIANCE.NS"))
            .and(query_param("period1", start.timestamp().to_string()))
            .and(query_param("period2", end.timestamp().to_string()))
            .and(query_param("interval", "5m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": {"symbol": "RELIANCE.NS"},
                        "timestamp": [1704067200],
                        "indicators": {"quote": [{
                            "open": [2500.0], "high": [2510.0], "low": [2490.0],
                            "close": [2505.0], "volume": [1000]
                        }]}
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let chart = provider(&server)
            .await
            .chart(
                "RELIANCE.NS",
                ChartRequest {
                    period1: start,
                    period2: end,
                    interval: Interval::parse("5m").unwrap(),
                },
            )
            .await
            .unwrap();

        assert_eq!(chart.symbol, "RELIANCE.NS");
        assert_eq!(chart.bars.len(), 1);
        assert_eq!(chart.bars[0].close, Some(2505.0));
    }

    #[tokio::test]
    async fn chart_embedded_not_found_maps_to_symbol_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/v8/finance/chart/BOGUS"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
                }
            })))
            .mount(&server)
            .await;

        let now = Utc::now();
        let err = provider(&server)
            .await
            .chart(
                "BOGUS",
                ChartRequest {
                    period1: now,
                    period2: now,
                    interval: Interval::parse("1d").unwrap(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::SymbolNotFound { .. }));
    }

    #[tokio::test]
    async fn chart_symbol_is_a_single_encoded_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/A%2FB%3Fx"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": [{
                        "meta": {"symbol": "A/B?x"},
                        "timestamp": [],
                        "indicators": {"quote": [{}]}
                    }],
                    "error": null
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc::now();
        let chart = provider(&server)
            .await
            .chart(
                "A/B?x",
                ChartRequest {
                    period1: now,
                    period2: now,
                    interval: Interval::OneDay,
                },
            )
            .await
            .unwrap();

        assert_eq!(chart.symbol, "A/B?x");
        assert!(chart.bars.is_empty());
    }

    #[tokio::test]
    async fn search_returns_quotes() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/finance/search"))
            .and(query_param("q", "tata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "quotes": [
                    {"symbol": "TATAMOTORS.NS", "shortname": "TATA MOTORS", "quoteType": "EQUITY", "exchange": "NSI"},
                    {"symbol": "^TATA", "quoteType": "INDEX"}
                ]
            })))
            .mount(&server)
            .await;

        let hits = provider(&server).await.search("tata").await.unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].is_equity());
        assert!(!hits[1].is_equity());
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/finance/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = provider(&server).await.search("x").await.unwrap_err();

        assert!(matches!(err, ProviderError::Parse(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_connection_error() {
        let provider = YahooProvider::new(&YahooConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(500),
            search_count: 10,
        })
        .unwrap();

        let err = provider.quote("TCS.NS").await.unwrap_err();

        assert!(matches!(err, ProviderError::Connection { .. }));
    }
}
