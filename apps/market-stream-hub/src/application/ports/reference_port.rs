//! Reference Table Port
//!
//! Static, in-memory symbol reference data with a ranked text lookup.

use std::collections::HashSet;

/// One reference entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceStock {
    /// Bare exchange symbol (no suffix).
    pub symbol: &'static str,
    /// Company name.
    pub name: &'static str,
    /// Sector label.
    pub sector: &'static str,
}

/// Port for local symbol lookups. Synchronous; never touches the network.
pub trait ReferenceTable: Send + Sync {
    /// All entries in table order.
    fn entries(&self) -> &[ReferenceStock];

    /// Ranked case-insensitive lookup.
    ///
    /// Symbol-prefix matches come first, then entries whose symbol or name
    /// contains the query, each group in table order. Duplicate symbols are
    /// dropped and at most `limit` results are returned.
    fn search(&self, query: &str, limit: usize) -> Vec<ReferenceStock> {
        let q = query.trim().to_uppercase();
        if q.is_empty() || limit == 0 {
            return vec![];
        }

        let mut prefix = Vec::new();
        let mut contains = Vec::new();
        for stock in self.entries() {
            if prefix.len() + contains.len() >= limit.saturating_mul(2) {
                break;
            }
            let symbol = stock.symbol.to_uppercase();
            if symbol.starts_with(&q) {
                prefix.push(*stock);
            } else if symbol.contains(&q) || stock.name.to_uppercase().contains(&q) {
                contains.push(*stock);
            }
        }

        let mut seen = HashSet::new();
        prefix
            .into_iter()
            .chain(contains)
            .filter(|s| seen.insert(s.symbol))
            .take(limit)
            .collect()
    }
}
