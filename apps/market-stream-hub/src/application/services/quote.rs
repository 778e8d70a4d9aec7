//! Quote Service
//!
//! Resolves the requested symbol and returns a display-ready quote snapshot,
//! cached briefly per resolved symbol.

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{MarketDataProvider, ProviderQuote};
use crate::domain::market::Quote;
use crate::domain::market::format::{format_large_number, round2};
use crate::domain::market::symbol::{canonicalize, stock_key};
use crate::infrastructure::metrics;

use super::{FailOpenCache, ServiceError, SymbolResolver};

const QUOTE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CURRENCY: &str = "USD";

/// Quote lookups.
pub struct QuoteService {
    resolver: Arc<SymbolResolver>,
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<FailOpenCache>,
}

impl QuoteService {
    /// Create a new quote service.
    #[must_use]
    pub fn new(
        resolver: Arc<SymbolResolver>,
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<FailOpenCache>,
    ) -> Self {
        Self {
            resolver,
            provider,
            cache,
        }
    }

    /// Quote snapshot for a user-supplied symbol.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for a blank symbol and
    /// [`ServiceError::Upstream`] when the provider lookup fails.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote, ServiceError> {
        if canonicalize(symbol).is_empty() {
            return Err(ServiceError::Validation("symbol is required".to_string()));
        }

        let resolved = self.resolver.resolve(symbol).await;
        let key = stock_key(&resolved);
        if let Some(cached) = self.cache.get_json::<Quote>(&key).await {
            return Ok(cached);
        }

        let raw = self.provider.quote(&resolved).await.map_err(|e| {
            metrics::record_provider_error("quote");
            tracing::warn!(symbol = %resolved, error = %e, "Quote lookup failed");
            e
        })?;

        let quote = build_quote(&resolved, raw);
        self.cache.set_json(&key, &quote, QUOTE_TTL).await;
        Ok(quote)
    }
}

fn build_quote(resolved: &str, raw: ProviderQuote) -> Quote {
    let symbol = if raw.symbol.is_empty() {
        resolved.to_string()
    } else {
        raw.symbol
    };
    let name = raw
        .short_name
        .filter(|s| !s.is_empty())
        .or_else(|| raw.long_name.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| symbol.clone());

    Quote {
        name,
        price: raw.regular_market_price,
        change: raw.regular_market_change.map_or(0.0, round2),
        change_percent: raw.regular_market_change_percent.map_or(0.0, round2),
        market_cap: format_large_number(raw.market_cap),
        volume: format_large_number(raw.regular_market_volume),
        high: raw.regular_market_day_high,
        low: raw.regular_market_day_low,
        prev_close: raw.regular_market_previous_close,
        open: raw.regular_market_open,
        fifty_two_week_high: raw.fifty_two_week_high,
        fifty_two_week_low: raw.fifty_two_week_low,
        currency: raw
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_quote_applies_fallbacks() {
        let quote = build_quote(
            "TCS.NS",
            ProviderQuote {
                symbol: "TCS.NS".to_string(),
                long_name: Some("Tata Consultancy Services Limited".to_string()),
                regular_market_price: Some(3500.0),
                regular_market_change: Some(12.345_6),
                market_cap: Some(1.5e13),
                regular_market_volume: Some(1_500_000.0),
                ..ProviderQuote::default()
            },
        );

        assert_eq!(quote.name, "Tata Consultancy Services Limited");
        assert_eq!(quote.change, 12.35);
        assert_eq!(quote.change_percent, 0.0);
        assert_eq!(quote.market_cap, "15.00T");
        assert_eq!(quote.volume, "15.00L");
        assert_eq!(quote.currency, "USD");
        assert!(quote.high.is_none());
    }

    #[test]
    fn build_quote_prefers_short_name_and_currency() {
        let quote = build_quote(
            "INFY.NS",
            ProviderQuote {
                symbol: String::new(),
                short_name: Some("INFOSYS".to_string()),
                long_name: Some("Infosys Limited".to_string()),
                currency: Some("INR".to_string()),
                ..ProviderQuote::default()
            },
        );

        assert_eq!(quote.symbol, "INFY.NS");
        assert_eq!(quote.name, "INFOSYS");
        assert_eq!(quote.currency, "INR");
        assert_eq!(quote.market_cap, "-");
    }
}
