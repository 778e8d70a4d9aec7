//! Search Service
//!
//! Hybrid symbol search: the local reference table answers common queries
//! without a network hop; the provider fills in when local matches are thin.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{MarketDataProvider, ReferenceStock, ReferenceTable, SearchQuote};
use crate::domain::market::SearchResult;
use crate::domain::market::symbol::{search_key, strip_suffix};
use crate::infrastructure::metrics;

use super::{FailOpenCache, ServiceError};

/// Result cap for the merged list.
const DEFAULT_LIMIT: usize = 8;
/// Local hits at or above this count skip the provider.
const LOCAL_SUFFICIENT: usize = 3;
/// Remote equity hits considered for merging.
const REMOTE_TAKE: usize = 10;
/// Exchange label for reference-table hits.
const LOCAL_EXCHANGE: &str = "NSE";

const SEARCH_TTL: Duration = Duration::from_secs(300);
const DEGRADED_TTL: Duration = Duration::from_secs(60);

/// Symbol search.
pub struct SearchService {
    reference: Arc<dyn ReferenceTable>,
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<FailOpenCache>,
    home_suffixes: Vec<String>,
    limit: usize,
}

impl SearchService {
    /// Create a search service.
    #[must_use]
    pub fn new(
        reference: Arc<dyn ReferenceTable>,
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<FailOpenCache>,
        home_suffixes: Vec<String>,
    ) -> Self {
        Self {
            reference,
            provider,
            cache,
            home_suffixes,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Search by symbol or company name.
    ///
    /// Remote failures degrade to local-only results.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] when the query is blank.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ServiceError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::Validation(
                "Query parameter 'q' is required".to_string(),
            ));
        }

        let key = search_key(query);
        if let Some(cached) = self.cache.get_json::<Vec<SearchResult>>(&key).await {
            return Ok(cached);
        }

        let local: Vec<SearchResult> = self
            .reference
            .search(query, self.limit)
            .into_iter()
            .map(local_result)
            .collect();

        if local.len() >= LOCAL_SUFFICIENT {
            self.cache.set_json(&key, &local, SEARCH_TTL).await;
            return Ok(local);
        }

        match self.provider.search(query).await {
            Ok(hits) => {
                let merged = self.merge(local, &hits);
                self.cache.set_json(&key, &merged, SEARCH_TTL).await;
                Ok(merged)
            }
            Err(e) => {
                metrics::record_provider_error("search");
                tracing::warn!(query, error = %e, "Remote search failed, serving local results");
                self.cache.set_json(&key, &local, DEGRADED_TTL).await;
                Ok(local)
            }
        }
    }

    fn merge(&self, local: Vec<SearchResult>, hits: &[SearchQuote]) -> Vec<SearchResult> {
        let mut seen: HashSet<String> = local.iter().map(|r| r.symbol.clone()).collect();
        let mut merged = local;

        for hit in hits.iter().filter(|h| h.is_equity()).take(REMOTE_TAKE) {
            if merged.len() >= self.limit {
                break;
            }
            let base = strip_suffix(&hit.symbol, &self.home_suffixes);
            if seen.contains(base) || seen.contains(hit.symbol.as_str()) {
                continue;
            }
            seen.insert(base.to_string());
            merged.push(SearchResult {
                symbol: hit.symbol.clone(),
                name: hit.display_name().to_string(),
                exchange: hit.exchange_name().to_string(),
                sector: None,
            });
        }
        merged
    }
}

fn local_result(stock: ReferenceStock) -> SearchResult {
    SearchResult {
        symbol: stock.symbol.to_string(),
        name: stock.name.to_string(),
        exchange: LOCAL_EXCHANGE.to_string(),
        sector: Some(stock.sector.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        ChartData, ChartRequest, ProviderError, ProviderQuote,
    };
    use crate::infrastructure::cache::MemoryCache;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Table(Vec<ReferenceStock>);

    impl ReferenceTable for Table {
        fn entries(&self) -> &[ReferenceStock] {
            &self.0
        }
    }

    struct Remote {
        hits: Result<Vec<SearchQuote>, ProviderError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for Remote {
        async fn quote(&self, symbol: &str) -> Result<ProviderQuote, ProviderError> {
            Err(ProviderError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
        }

        async fn chart(&self, _: &str, _: ChartRequest) -> Result<ChartData, ProviderError> {
            Ok(ChartData::default())
        }

        async fn search(&self, _: &str) -> Result<Vec<SearchQuote>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.hits.clone()
        }
    }

    fn equity(symbol: &str, name: &str) -> SearchQuote {
        SearchQuote {
            symbol: symbol.to_string(),
            shortname: Some(name.to_string()),
            quote_type: Some("EQUITY".to_string()),
            exch_disp: Some("NSE".to_string()),
            ..SearchQuote::default()
        }
    }

    const fn stock(symbol: &'static str, name: &'static str) -> ReferenceStock {
        ReferenceStock {
            symbol,
            name,
            sector: "Technology",
        }
    }

    fn service(table: Vec<ReferenceStock>, remote: Arc<Remote>) -> SearchService {
        SearchService::new(
            Arc::new(Table(table)),
            remote,
            Arc::new(FailOpenCache::new(Arc::new(MemoryCache::new()))),
            vec![".NS".to_string(), ".BO".to_string()],
        )
    }

    #[tokio::test]
    async fn merge_skips_symbols_already_listed_locally() {
        let remote = Arc::new(Remote {
            hits: Ok(vec![
                equity("WIPRO.NS", "Wipro"),
                equity("WIPRO.BO", "Wipro"),
                SearchQuote {
                    symbol: "WIPRO-F".to_string(),
                    quote_type: Some("FUTURE".to_string()),
                    ..SearchQuote::default()
                },
                equity("WIPROX.NS", "Wipro X"),
            ]),
            calls: AtomicUsize::new(0),
        });
        let svc = service(vec![stock("WIPRO", "Wipro Ltd")], Arc::clone(&remote));

        let results = svc.search("wipro").await.unwrap();
        let symbols: Vec<_> = results.iter().map(|r| r.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["WIPRO", "WIPROX.NS"]);
        assert_eq!(results[0].sector.as_deref(), Some("Technology"));
        assert_eq!(results[1].exchange, "NSE");
        assert!(results[1].sector.is_none());
    }

    #[tokio::test]
    async fn results_are_cached_by_lowercased_query() {
        let remote = Arc::new(Remote {
            hits: Ok(vec![]),
            calls: AtomicUsize::new(0),
        });
        let svc = service(vec![], Arc::clone(&remote));

        svc.search("Infy").await.unwrap();
        svc.search("INFY").await.unwrap();

        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let remote = Arc::new(Remote {
            hits: Ok(vec![]),
            calls: AtomicUsize::new(0),
        });
        let svc = service(vec![], remote);

        let err = svc.search("  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Query parameter 'q' is required");
    }
}
