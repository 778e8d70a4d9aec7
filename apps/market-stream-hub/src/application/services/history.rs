//! History Service
//!
//! OHLCV candles for a symbol over a named range, with a fallback chain for
//! intraday requests the provider cannot serve.
//!
//! 1. Requested interval over the (clamped) range.
//! 2. Intraday request that errored: daily bars over five days, uncached.
//! 3. Intraday request with no usable bars: daily bars over the same window,
//!    cached briefly.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::application::ports::{ChartBar, ChartData, ChartRequest, MarketDataProvider};
use crate::domain::market::format::round2;
use crate::domain::market::period::{HistoryRange, Interval};
use crate::domain::market::symbol::{canonicalize, history_key};
use crate::domain::market::{Candle, CandleTime};
use crate::infrastructure::metrics;

use super::{Clock, FailOpenCache, ServiceError, SymbolResolver, system_clock};

/// TTL for a daily series served in place of an empty intraday one.
const DAILY_FALLBACK_TTL: Duration = Duration::from_secs(60);

/// History lookups.
pub struct HistoryService {
    resolver: Arc<SymbolResolver>,
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<FailOpenCache>,
    exchange_offset: FixedOffset,
    clock: Clock,
}

impl HistoryService {
    /// Create a history service rendering daily dates in `exchange_offset`.
    #[must_use]
    pub fn new(
        resolver: Arc<SymbolResolver>,
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<FailOpenCache>,
        exchange_offset: FixedOffset,
    ) -> Self {
        Self {
            resolver,
            provider,
            cache,
            exchange_offset,
            clock: system_clock(),
        }
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Candles for `symbol`.
    ///
    /// `range` falls back to one month when unknown; `interval` must be one
    /// of the supported tokens (empty means daily).
    ///
    /// # Errors
    ///
    /// [`ServiceError::Validation`] for a blank symbol or unknown interval,
    /// [`ServiceError::Upstream`] once the fallback chain is exhausted.
    pub async fn get_history(
        &self,
        symbol: &str,
        range: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, ServiceError> {
        if canonicalize(symbol).is_empty() {
            return Err(ServiceError::Validation("symbol is required".to_string()));
        }
        let interval = Interval::parse(interval)?;
        let range = interval.clamp(HistoryRange::parse(range));

        let resolved = self.resolver.resolve(symbol).await;
        let key = history_key(&resolved, range.as_str(), interval.as_str());
        if let Some(cached) = self.cache.get_json::<Vec<Candle>>(&key).await {
            return Ok(cached);
        }

        let now = (self.clock)();
        let request = ChartRequest {
            period1: range.window_start(now),
            period2: now,
            interval,
        };

        let data = match self.provider.chart(&resolved, request).await {
            Ok(data) => data,
            Err(e) if interval.is_intraday() => {
                metrics::record_provider_error("chart");
                tracing::warn!(
                    symbol = %resolved,
                    interval = interval.as_str(),
                    error = %e,
                    "Intraday chart failed, falling back to daily bars"
                );
                let fallback = ChartRequest {
                    period1: HistoryRange::FiveDays.window_start(now),
                    period2: now,
                    interval: Interval::OneDay,
                };
                let data = self.fetch(&resolved, fallback).await?;
                return Ok(self.normalize(data, Interval::OneDay));
            }
            Err(e) => {
                metrics::record_provider_error("chart");
                tracing::warn!(symbol = %resolved, error = %e, "Chart lookup failed");
                return Err(e.into());
            }
        };

        let candles = self.normalize(data, interval);
        if candles.is_empty() && interval.is_intraday() {
            tracing::info!(
                symbol = %resolved,
                interval = interval.as_str(),
                "No intraday bars, retrying with daily bars"
            );
            let daily = ChartRequest {
                interval: Interval::OneDay,
                ..request
            };
            let data = self.fetch(&resolved, daily).await?;
            let candles = self.normalize(data, Interval::OneDay);
            self.cache.set_json(&key, &candles, DAILY_FALLBACK_TTL).await;
            return Ok(candles);
        }

        self.cache.set_json(&key, &candles, interval.cache_ttl()).await;
        Ok(candles)
    }

    async fn fetch(&self, symbol: &str, request: ChartRequest) -> Result<ChartData, ServiceError> {
        self.provider.chart(symbol, request).await.map_err(|e| {
            metrics::record_provider_error("chart");
            tracing::warn!(symbol, error = %e, "Fallback chart lookup failed");
            e.into()
        })
    }

    /// Drop unusable bars, round prices, then sort and dedupe by time.
    fn normalize(&self, data: ChartData, interval: Interval) -> Vec<Candle> {
        let mut bars: Vec<ChartBar> = data
            .bars
            .into_iter()
            .filter(|bar| bar.open.is_some() && bar.close.is_some())
            .collect();
        bars.sort_by_key(|bar| bar.timestamp);

        let mut candles: Vec<Candle> = bars
            .into_iter()
            .filter_map(|bar| self.to_candle(&bar, interval))
            .collect();
        candles.dedup_by(|later, earlier| later.time == earlier.time);
        candles
    }

    fn to_candle(&self, bar: &ChartBar, interval: Interval) -> Option<Candle> {
        let open = bar.open?;
        let close = bar.close?;
        let time = if interval.is_intraday() {
            CandleTime::Epoch(bar.timestamp)
        } else {
            CandleTime::Date(self.exchange_date(bar.timestamp)?)
        };

        Some(Candle {
            time,
            open: round2(open),
            high: round2(bar.high.unwrap_or_else(|| open.max(close))),
            low: round2(bar.low.unwrap_or_else(|| open.min(close))),
            close: round2(close),
            volume: bar.volume.unwrap_or(0),
        })
    }

    fn exchange_date(&self, timestamp: i64) -> Option<String> {
        let utc: DateTime<Utc> = Utc.timestamp_opt(timestamp, 0).single()?;
        Some(
            utc.with_timezone(&self.exchange_offset)
                .format("%Y-%m-%d")
                .to_string(),
        )
    }
}
