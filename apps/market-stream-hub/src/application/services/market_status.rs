//! Market Status Service
//!
//! Whether the home exchange is in its regular session, evaluated on the
//! exchange's wall clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Offset, Utc, Weekday};

use crate::domain::market::MarketStatus;
use crate::domain::market::symbol::MARKET_STATUS_KEY;

use super::{Clock, FailOpenCache, system_clock};

const STATUS_TTL: Duration = Duration::from_secs(30);
const CLOCK_FORMAT: &str = "%I:%M %p";

/// Regular session definition for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradingHours {
    /// Exchange UTC offset.
    pub utc_offset: FixedOffset,
    /// Session open, exchange-local.
    pub open: NaiveTime,
    /// Session close, exchange-local (exclusive).
    pub close: NaiveTime,
    /// Days with a regular session.
    pub trading_days: Vec<Weekday>,
}

impl Default for TradingHours {
    /// NSE: 09:15 to 15:30 IST, Monday to Friday.
    fn default() -> Self {
        Self {
            utc_offset: FixedOffset::east_opt(330 * 60).unwrap_or_else(|| Utc.fix()),
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

impl TradingHours {
    /// Whether `now` falls inside a regular session.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.utc_offset);
        let time = local.time();
        self.trading_days.contains(&local.weekday()) && self.open <= time && time < self.close
    }

    fn status_at(&self, now: DateTime<Utc>) -> MarketStatus {
        let is_open = self.is_open_at(now);
        let local = now.with_timezone(&self.utc_offset);
        MarketStatus {
            is_open,
            current_time: local.format(CLOCK_FORMAT).to_string(),
            open_time: self.open.format(CLOCK_FORMAT).to_string(),
            close_time: self.close.format(CLOCK_FORMAT).to_string(),
            message: if is_open {
                "Market is Open"
            } else {
                "Market is Closed"
            }
            .to_string(),
            cached: false,
        }
    }
}

/// Market status lookups.
pub struct MarketStatusService {
    cache: Arc<FailOpenCache>,
    hours: TradingHours,
    clock: Clock,
}

impl MarketStatusService {
    /// Create a status service for the given session.
    #[must_use]
    pub fn new(cache: Arc<FailOpenCache>, hours: TradingHours) -> Self {
        Self {
            cache,
            hours,
            clock: system_clock(),
        }
    }

    /// Replace the wall clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current status. `cached` reports whether it came from cache.
    pub async fn status(&self) -> MarketStatus {
        if let Some(mut cached) = self.cache.get_json::<MarketStatus>(MARKET_STATUS_KEY).await {
            cached.cached = true;
            return cached;
        }

        let status = self.hours.status_at((self.clock)());
        self.cache.set_json(MARKET_STATUS_KEY, &status, STATUS_TTL).await;
        status
    }
}
