//! REST API Integration Tests
//!
//! Drives the router end to end against an in-memory cache and a scripted
//! provider.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use market_stream_hub::application::ports::{
    ChartBar, ChartData, ChartRequest, MarketDataProvider, ProviderError, ProviderQuote,
    SearchQuote,
};
use market_stream_hub::application::services::{
    FailOpenCache, HistoryService, HubSettings, MarketStatusService, QuoteService, SearchService,
    SubscriptionHub, SymbolResolver, TradingHours,
};
use market_stream_hub::domain::market::period::Interval;
use market_stream_hub::infrastructure::broadcast::{BroadcastConfig, InProcessTickBus};
use market_stream_hub::infrastructure::cache::MemoryCache;
use market_stream_hub::infrastructure::http::{ApiState, router};
use market_stream_hub::infrastructure::reference::NseReferenceTable;

// =============================================================================
// Scripted provider
// =============================================================================

#[derive(Default)]
struct ScriptedProvider {
    quotes: HashMap<String, ProviderQuote>,
    hits: Option<Vec<SearchQuote>>,
    intraday: Option<Vec<ChartBar>>,
    daily: Vec<ChartBar>,
    chart_calls: Mutex<Vec<ChartRequest>>,
    search_calls: AtomicUsize,
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    async fn quote(&self, symbol: &str) -> Result<ProviderQuote, ProviderError> {
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    async fn chart(&self, symbol: &str, request: ChartRequest) -> Result<ChartData, ProviderError> {
        self.chart_calls.lock().push(request);
        let bars = if request.interval.is_intraday() {
            self.intraday.clone().ok_or_else(|| ProviderError::Api {
                status: 422,
                message: "intraday unavailable".to_string(),
            })?
        } else {
            self.daily.clone()
        };
        Ok(ChartData {
            symbol: symbol.to_string(),
            bars,
        })
    }

    async fn search(&self, _term: &str) -> Result<Vec<SearchQuote>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.hits.clone().ok_or(ProviderError::Connection {
            message: "connection refused".to_string(),
        })
    }
}

fn equity(symbol: &str, name: &str) -> SearchQuote {
    SearchQuote {
        symbol: symbol.to_string(),
        shortname: Some(name.to_string()),
        quote_type: Some("EQUITY".to_string()),
        exchange: Some("NSI".to_string()),
        exch_disp: Some("NSE".to_string()),
        ..SearchQuote::default()
    }
}

fn bar(timestamp: i64, close: f64) -> ChartBar {
    ChartBar {
        timestamp,
        open: Some(close - 1.0),
        high: Some(close + 2.0),
        low: Some(close - 2.0),
        close: Some(close),
        volume: Some(1_000),
    }
}

// =============================================================================
// Harness
// =============================================================================

fn app(provider: Arc<ScriptedProvider>) -> axum::Router {
    let cache = Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new())));
    let suffixes = vec![".NS".to_string(), ".BO".to_string()];
    let hours = TradingHours::default();
    let resolver = Arc::new(SymbolResolver::new(
        provider.clone(),
        Arc::clone(&cache),
        suffixes.clone(),
    ));
    let bus = Arc::new(InProcessTickBus::new(BroadcastConfig::default()));

    router(Arc::new(ApiState {
        quotes: Arc::new(QuoteService::new(
            Arc::clone(&resolver),
            provider.clone(),
            Arc::clone(&cache),
        )),
        history: Arc::new(HistoryService::new(
            Arc::clone(&resolver),
            provider.clone(),
            Arc::clone(&cache),
            hours.utc_offset,
        )),
        search: Arc::new(SearchService::new(
            Arc::new(NseReferenceTable::new()),
            provider,
            Arc::clone(&cache),
            suffixes,
        )),
        market: Arc::new(MarketStatusService::new(Arc::clone(&cache), hours)),
        hub: Arc::new(SubscriptionHub::new(HubSettings::default(), cache, bus)),
    }))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn root_reports_ok() {
    let (status, body) = get(app(Arc::default()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn quote_resolves_bare_symbol_to_home_listing() {
    let mut quotes = HashMap::new();
    quotes.insert(
        "TCS.NS".to_string(),
        ProviderQuote {
            symbol: "TCS.NS".to_string(),
            short_name: Some("TATA CONSULTANCY SERV LT".to_string()),
            regular_market_price: Some(3500.5),
            regular_market_change: Some(12.346),
            currency: Some("INR".to_string()),
            ..ProviderQuote::default()
        },
    );
    let provider = Arc::new(ScriptedProvider {
        quotes,
        hits: Some(vec![
            equity("TCS.BO", "TATA CONSULTANCY SERV LT"),
            equity("TCS.NS", "TATA CONSULTANCY SERV LT"),
        ]),
        ..ScriptedProvider::default()
    });

    let (status, body) = get(app(provider), "/api/stocks/tcs").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "TCS.NS");
    assert_eq!(body["name"], "TATA CONSULTANCY SERV LT");
    assert_eq!(body["price"], 3500.5);
    assert_eq!(body["change"], 12.35);
    assert_eq!(body["currency"], "INR");
}

#[tokio::test]
async fn quote_failure_hides_provider_details() {
    let (status, body) = get(app(Arc::default()), "/api/stocks/NOSUCH").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch stock data");
}

#[tokio::test]
async fn search_requires_query() {
    let (status, body) = get(app(Arc::default()), "/api/stocks/search?q=%20").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter 'q' is required");
}

#[tokio::test]
async fn search_answers_common_names_locally() {
    let provider = Arc::new(ScriptedProvider::default());

    let (status, body) = get(app(provider.clone()), "/api/stocks/search?q=tata").await;

    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert!(hits.len() >= 3);
    assert!(hits.iter().all(|hit| hit["exchange"] == "NSE"));
    assert_eq!(provider.search_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn search_degrades_to_local_results_when_remote_fails() {
    let provider = Arc::new(ScriptedProvider::default());

    let (status, body) = get(app(provider.clone()), "/api/stocks/search?q=qwertyuiop").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(vec![]));
    assert_eq!(provider.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_merges_remote_hits() {
    let provider = Arc::new(ScriptedProvider {
        hits: Some(vec![equity("QWERTY.NS", "Qwerty Industries")]),
        ..ScriptedProvider::default()
    });

    let (status, body) = get(app(provider), "/api/stocks/search?q=qwerty").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["symbol"], "QWERTY.NS");
    assert_eq!(body[0]["name"], "Qwerty Industries");
    assert!(body[0].get("sector").is_none());
}

#[tokio::test]
async fn history_rejects_unknown_interval() {
    let (status, body) =
        get(app(Arc::default()), "/api/stocks/TCS.NS/history?interval=7m").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("7m"));
}

#[tokio::test]
async fn history_returns_daily_candles_with_dates() {
    let day = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap().timestamp();
    let provider = Arc::new(ScriptedProvider {
        daily: vec![bar(day + 86_400, 101.0), bar(day, 100.0)],
        ..ScriptedProvider::default()
    });

    let (status, body) = get(app(provider), "/api/stocks/TCS.NS/history?range=1mo").await;

    assert_eq!(status, StatusCode::OK);
    let candles = body.as_array().unwrap();
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0]["time"], "2024-03-04");
    assert_eq!(candles[1]["time"], "2024-03-05");
    assert_eq!(candles[1]["close"], 101.0);
}

#[tokio::test]
async fn empty_intraday_series_falls_back_to_daily() {
    let day = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap().timestamp();
    let provider = Arc::new(ScriptedProvider {
        intraday: Some(vec![]),
        daily: vec![bar(day, 100.0)],
        ..ScriptedProvider::default()
    });

    let (status, body) = get(
        app(provider.clone()),
        "/api/stocks/TCS.NS/history?range=1d&interval=5m",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["time"], "2024-03-04");
    let calls = provider.chart_calls.lock();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].interval, Interval::FiveMinutes);
    assert_eq!(calls[1].interval, Interval::OneDay);
    assert_eq!(calls[0].period1, calls[1].period1);
}

#[tokio::test]
async fn intraday_error_falls_back_to_five_daily_bars() {
    let day = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap().timestamp();
    let provider = Arc::new(ScriptedProvider {
        intraday: None,
        daily: vec![bar(day, 100.0)],
        ..ScriptedProvider::default()
    });

    let (status, body) = get(
        app(provider.clone()),
        "/api/stocks/TCS.NS/history?range=1d&interval=1m",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    let calls = provider.chart_calls.lock();
    assert_eq!(calls[1].interval, Interval::OneDay);
    assert_eq!((calls[1].period2 - calls[1].period1).num_days(), 5);
}

#[tokio::test]
async fn one_minute_history_requests_at_most_five_days_upstream() {
    let day = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap().timestamp();
    let provider = Arc::new(ScriptedProvider {
        intraday: Some(vec![bar(day, 100.0)]),
        ..ScriptedProvider::default()
    });

    let (status, _) = get(
        app(provider.clone()),
        "/api/stocks/RELIANCE.NS/history?range=1mo&interval=1m",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let calls = provider.chart_calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].interval, Interval::OneMinute);
    assert!((calls[0].period2 - calls[0].period1).num_days() <= 5);
}

#[tokio::test]
async fn market_status_reports_session_times() {
    let (status, body) = get(app(Arc::default()), "/api/market/status").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["isOpen"].is_boolean());
    assert_eq!(body["openTime"], "09:15 AM");
    assert_eq!(body["closeTime"], "03:30 PM");
}
