//! History ranges, bar intervals, and the clamp rules between them.
//!
//! The provider only serves fine-grained bars for recent windows, so each
//! intraday interval caps the range it can be paired with. Requests past the
//! cap are silently narrowed to it.

use std::time::Duration;

use chrono::{DateTime, Days, Months, TimeDelta, Utc};

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum HistoryRange {
    /// One day.
    OneDay,
    /// Five days.
    FiveDays,
    /// One calendar month.
    #[default]
    OneMonth,
    /// Three calendar months.
    ThreeMonths,
    /// Six calendar months.
    SixMonths,
    /// One year.
    OneYear,
    /// Five years.
    FiveYears,
}

impl HistoryRange {
    /// Parse a range token. Unknown or empty input means one month.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1d" => Self::OneDay,
            "5d" => Self::FiveDays,
            "3mo" => Self::ThreeMonths,
            "6mo" => Self::SixMonths,
            "1y" => Self::OneYear,
            "5y" => Self::FiveYears,
            _ => Self::OneMonth,
        }
    }

    /// Wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }

    /// Start of the window ending at `now`, using calendar arithmetic.
    #[must_use]
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start = match self {
            Self::OneDay => now.checked_sub_days(Days::new(1)),
            Self::FiveDays => now.checked_sub_days(Days::new(5)),
            Self::OneMonth => now.checked_sub_months(Months::new(1)),
            Self::ThreeMonths => now.checked_sub_months(Months::new(3)),
            Self::SixMonths => now.checked_sub_months(Months::new(6)),
            Self::OneYear => now.checked_sub_months(Months::new(12)),
            Self::FiveYears => now.checked_sub_months(Months::new(60)),
        };
        start.unwrap_or_else(|| now - TimeDelta::days(1))
    }
}

/// Bar width for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interval {
    /// 1 minute.
    OneMinute,
    /// 2 minutes.
    TwoMinutes,
    /// 5 minutes.
    FiveMinutes,
    /// 15 minutes.
    FifteenMinutes,
    /// 30 minutes.
    ThirtyMinutes,
    /// 60 minutes.
    SixtyMinutes,
    /// 90 minutes.
    NinetyMinutes,
    /// 1 hour.
    OneHour,
    /// 1 day.
    #[default]
    OneDay,
    /// 5 days.
    FiveDays,
    /// 1 week.
    OneWeek,
    /// 1 month.
    OneMonth,
    /// 3 months.
    ThreeMonths,
}

/// An interval token outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported interval: {0}")]
pub struct UnknownInterval(pub String);

impl Interval {
    /// Parse an interval token. Empty input means one day.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownInterval`] for tokens outside the supported set.
    pub fn parse(raw: &str) -> Result<Self, UnknownInterval> {
        let interval = match raw.trim() {
            "" | "1d" => Self::OneDay,
            "1m" => Self::OneMinute,
            "2m" => Self::TwoMinutes,
            "5m" => Self::FiveMinutes,
            "15m" => Self::FifteenMinutes,
            "30m" => Self::ThirtyMinutes,
            "60m" => Self::SixtyMinutes,
            "90m" => Self::NinetyMinutes,
            "1h" => Self::OneHour,
            "5d" => Self::FiveDays,
            "1wk" => Self::OneWeek,
            "1mo" => Self::OneMonth,
            "3mo" => Self::ThreeMonths,
            other => return Err(UnknownInterval(other.to_string())),
        };
        Ok(interval)
    }

    /// Wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::TwoMinutes => "2m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::SixtyMinutes => "60m",
            Self::NinetyMinutes => "90m",
            Self::OneHour => "1h",
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneWeek => "1wk",
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
        }
    }

    /// Minute and hour intervals.
    #[must_use]
    pub const fn is_intraday(self) -> bool {
        matches!(
            self,
            Self::OneMinute
                | Self::TwoMinutes
                | Self::FiveMinutes
                | Self::FifteenMinutes
                | Self::ThirtyMinutes
                | Self::SixtyMinutes
                | Self::NinetyMinutes
                | Self::OneHour
        )
    }

    /// Widest range this interval may be paired with, if capped.
    #[must_use]
    pub const fn max_range(self) -> Option<HistoryRange> {
        match self {
            Self::OneMinute | Self::TwoMinutes | Self::FiveMinutes => {
                Some(HistoryRange::FiveDays)
            }
            _ => None,
        }
    }

    /// Narrow `range` to what this interval allows.
    #[must_use]
    pub fn clamp(self, range: HistoryRange) -> HistoryRange {
        match self.max_range() {
            Some(max) if range > max => max,
            _ => range,
        }
    }

    /// Cache lifetime for a series at this interval.
    #[must_use]
    pub const fn cache_ttl(self) -> Duration {
        if self.is_intraday() {
            Duration::from_secs(30)
        } else {
            Duration::from_secs(300)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test_case("1d", HistoryRange::OneDay)]
    #[test_case("5y", HistoryRange::FiveYears)]
    #[test_case("", HistoryRange::OneMonth ; "empty")]
    #[test_case("2y", HistoryRange::OneMonth ; "unknown")]
    fn range_parse(raw: &str, expected: HistoryRange) {
        assert_eq!(HistoryRange::parse(raw), expected);
    }

    #[test]
    fn interval_parse() {
        assert_eq!(Interval::parse("").unwrap(), Interval::OneDay);
        assert_eq!(Interval::parse("1wk").unwrap(), Interval::OneWeek);
        assert_eq!(
            Interval::parse("4h").unwrap_err(),
            UnknownInterval("4h".to_string())
        );
    }

    #[test]
    fn tokens_round_trip() {
        for token in [
            "1m", "2m", "5m", "15m", "30m", "60m", "90m", "1h", "1d", "5d", "1wk", "1mo", "3mo",
        ] {
            assert_eq!(Interval::parse(token).unwrap().as_str(), token);
        }
    }

    #[test_case(Interval::OneMinute, HistoryRange::OneDay, HistoryRange::OneDay ; "1m keeps 1d")]
    #[test_case(Interval::OneMinute, HistoryRange::FiveDays, HistoryRange::FiveDays ; "1m keeps 5d")]
    #[test_case(Interval::OneMinute, HistoryRange::OneMonth, HistoryRange::FiveDays ; "1m caps 1mo")]
    #[test_case(Interval::FiveMinutes, HistoryRange::OneYear, HistoryRange::FiveDays ; "5m caps 1y")]
    #[test_case(Interval::TwoMinutes, HistoryRange::OneMonth, HistoryRange::FiveDays ; "2m caps 1mo")]
    #[test_case(Interval::FifteenMinutes, HistoryRange::SixMonths, HistoryRange::SixMonths ; "15m uncapped")]
    #[test_case(Interval::OneHour, HistoryRange::SixMonths, HistoryRange::SixMonths ; "1h uncapped")]
    #[test_case(Interval::OneDay, HistoryRange::FiveYears, HistoryRange::FiveYears ; "1d uncapped")]
    fn clamp_rules(interval: Interval, requested: HistoryRange, expected: HistoryRange) {
        assert_eq!(interval.clamp(requested), expected);
    }

    #[test]
    fn ttl_by_granularity() {
        assert_eq!(Interval::FiveMinutes.cache_ttl(), Duration::from_secs(30));
        assert_eq!(Interval::OneWeek.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn window_uses_calendar_months() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap();

        assert_eq!(
            HistoryRange::OneMonth.window_start(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap()
        );
        assert_eq!(
            HistoryRange::FiveDays.window_start(now),
            Utc.with_ymd_and_hms(2024, 3, 26, 10, 0, 0).unwrap()
        );
        assert_eq!(
            HistoryRange::OneYear.window_start(now),
            Utc.with_ymd_and_hms(2023, 3, 31, 10, 0, 0).unwrap()
        );
    }
}
