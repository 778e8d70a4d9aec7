//! Symbol Resolution
//!
//! Maps free-form user input (`tcs`, `TCS.NS`, `reliance`) to the symbol the
//! provider expects. Resolution never fails: when nothing better is found the
//! upper-cased input is returned as-is.

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{MarketDataProvider, SearchQuote};
use crate::domain::market::symbol::{
    canonicalize, has_exchange_suffix, resolve_key, strip_suffix, suffix_rank,
};

use super::FailOpenCache;

/// How long a confirmed resolution is remembered.
const RESOLVE_TTL: Duration = Duration::from_secs(3600);

/// Resolves user input to provider symbols.
pub struct SymbolResolver {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<FailOpenCache>,
    home_suffixes: Vec<String>,
}

impl SymbolResolver {
    /// Create a resolver preferring the given exchange suffixes, in order.
    #[must_use]
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<FailOpenCache>,
        home_suffixes: Vec<String>,
    ) -> Self {
        Self {
            provider,
            cache,
            home_suffixes,
        }
    }

    /// Configured home-exchange suffixes.
    #[must_use]
    pub fn home_suffixes(&self) -> &[String] {
        &self.home_suffixes
    }

    /// Resolve input to a provider symbol.
    ///
    /// Only confirmed resolutions are cached; the upper-cased fallback is not.
    pub async fn resolve(&self, input: &str) -> String {
        let upper = canonicalize(input);
        if upper.is_empty() {
            return upper;
        }

        let key = resolve_key(&upper);
        if let Some(cached) = self.cache.get_json::<String>(&key).await {
            return cached;
        }

        let confirmed = if has_exchange_suffix(&upper) {
            self.confirm_direct(&upper).await
        } else if let Some(direct) = self.confirm_direct(&upper).await {
            Some(direct)
        } else {
            self.best_search_match(&upper).await
        };

        match confirmed {
            Some(symbol) => {
                tracing::debug!(input = %upper, resolved = %symbol, "Resolved symbol");
                self.cache.set_json(&key, &symbol, RESOLVE_TTL).await;
                symbol
            }
            None => upper,
        }
    }

    async fn confirm_direct(&self, symbol: &str) -> Option<String> {
        match self.provider.quote(symbol).await {
            Ok(quote) if !quote.symbol.is_empty() => Some(quote.symbol),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "Direct quote lookup failed");
                None
            }
        }
    }

    async fn best_search_match(&self, upper: &str) -> Option<String> {
        match self.provider.search(upper).await {
            Ok(hits) => self.pick_best(upper, &hits),
            Err(e) => {
                tracing::debug!(query = upper, error = %e, "Search lookup failed");
                None
            }
        }
    }

    /// Home-exchange match on the bare symbol, then exact symbol, then first equity.
    fn pick_best(&self, upper: &str, hits: &[SearchQuote]) -> Option<String> {
        let equities: Vec<&SearchQuote> = hits.iter().filter(|h| h.is_equity()).collect();

        let home = equities
            .iter()
            .filter_map(|h| {
                let rank = suffix_rank(&h.symbol, &self.home_suffixes)?;
                let base = strip_suffix(&h.symbol, &self.home_suffixes);
                base.eq_ignore_ascii_case(upper).then_some((rank, *h))
            })
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, h)| h);

        home.or_else(|| {
            equities
                .iter()
                .copied()
                .find(|h| h.symbol.eq_ignore_ascii_case(upper))
        })
        .or_else(|| equities.first().copied())
        .map(|h| h.symbol.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ChartData, ChartRequest, ProviderError, ProviderQuote};
    use crate::infrastructure::cache::MemoryCache;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeProvider {
        known: Vec<&'static str>,
        hits: Vec<SearchQuote>,
        quote_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn quote(&self, symbol: &str) -> Result<ProviderQuote, ProviderError> {
            self.quote_calls.lock().push(symbol.to_string());
            if self.known.contains(&symbol) {
                Ok(ProviderQuote {
                    symbol: symbol.to_string(),
                    ..ProviderQuote::default()
                })
            } else {
                Err(ProviderError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
        }

        async fn chart(&self, _: &str, _: ChartRequest) -> Result<ChartData, ProviderError> {
            Ok(ChartData::default())
        }

        async fn search(&self, _: &str) -> Result<Vec<SearchQuote>, ProviderError> {
            Ok(self.hits.clone())
        }
    }

    fn equity(symbol: &str) -> SearchQuote {
        SearchQuote {
            symbol: symbol.to_string(),
            quote_type: Some("EQUITY".to_string()),
            ..SearchQuote::default()
        }
    }

    fn resolver(provider: FakeProvider) -> (SymbolResolver, Arc<FailOpenCache>) {
        let cache = Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new())));
        let resolver = SymbolResolver::new(
            Arc::new(provider),
            Arc::clone(&cache),
            vec![".NS".to_string(), ".BO".to_string()],
        );
        (resolver, cache)
    }

    #[tokio::test]
    async fn prefers_home_exchange_listing() {
        let (resolver, cache) = resolver(FakeProvider {
            hits: vec![equity("TCS"), equity("TCS.BO"), equity("TCS.NS")],
            ..FakeProvider::default()
        });

        assert_eq!(resolver.resolve("tcs").await, "TCS.NS");
        assert_eq!(
            cache.get_json::<String>("resolve:TCS").await.as_deref(),
            Some("TCS.NS")
        );
    }

    #[tokio::test]
    async fn falls_back_to_exact_then_first_equity() {
        let (exact, _) = resolver(FakeProvider {
            hits: vec![equity("APPLE.X"), equity("AAPL")],
            ..FakeProvider::default()
        });
        assert_eq!(exact.resolve("aapl").await, "AAPL");

        let (first_equity, _) = resolver(FakeProvider {
            hits: vec![
                SearchQuote {
                    symbol: "^NSEI".to_string(),
                    quote_type: Some("INDEX".to_string()),
                    ..SearchQuote::default()
                },
                equity("NIFTYBEES.NS"),
            ],
            ..FakeProvider::default()
        });
        assert_eq!(first_equity.resolve("nifty").await, "NIFTYBEES.NS");
    }

    #[tokio::test]
    async fn direct_quote_wins_over_search() {
        let (resolver, _) = resolver(FakeProvider {
            known: vec!["AAPL"],
            hits: vec![equity("AAPL.NS")],
            ..FakeProvider::default()
        });
        assert_eq!(resolver.resolve(" aapl ").await, "AAPL");
    }

    #[tokio::test]
    async fn suffixed_input_is_not_searched_and_unconfirmed_is_not_cached() {
        let (resolver, cache) = resolver(FakeProvider {
            hits: vec![equity("OTHER.NS")],
            ..FakeProvider::default()
        });

        assert_eq!(resolver.resolve("nothing.ns").await, "NOTHING.NS");
        assert!(cache.get_json::<String>("resolve:NOTHING.NS").await.is_none());
    }

    #[tokio::test]
    async fn unresolvable_input_returns_upper() {
        let (resolver, _) = resolver(FakeProvider::default());
        assert_eq!(resolver.resolve("zzzz").await, "ZZZZ");
    }

    #[tokio::test]
    async fn cached_resolution_skips_provider() {
        let provider = Arc::new(FakeProvider::default());
        let cache = Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new())));
        cache
            .set_json("resolve:TCS", &"TCS.NS", Duration::from_secs(60))
            .await;
        let resolver = SymbolResolver::new(
            Arc::clone(&provider) as Arc<dyn MarketDataProvider>,
            cache,
            vec![".NS".to_string()],
        );

        assert_eq!(resolver.resolve("TCS").await, "TCS.NS");
        assert!(provider.quote_calls.lock().is_empty());
    }
}
