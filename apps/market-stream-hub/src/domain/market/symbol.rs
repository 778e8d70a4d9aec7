//! Symbol canonicalization and cache key namespaces.

/// Namespace for the latest tick per symbol.
pub const TICK_PREFIX: &str = "tick:";
/// Namespace for quote snapshots.
pub const STOCK_PREFIX: &str = "stock:";
/// Namespace for candle series.
pub const HISTORY_PREFIX: &str = "history:";
/// Namespace for search results.
pub const SEARCH_PREFIX: &str = "search:";
/// Namespace for resolved symbols.
pub const RESOLVE_PREFIX: &str = "resolve:";
/// Key holding the cached exchange status.
pub const MARKET_STATUS_KEY: &str = "market:status";

/// Canonical form of a user-entered symbol: trimmed and uppercased.
#[must_use]
pub fn canonicalize(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Whether the symbol already names an exchange (`TCS.NS`, `BRK.B`).
#[must_use]
pub fn has_exchange_suffix(symbol: &str) -> bool {
    symbol.contains('.')
}

/// Strip the first matching suffix from `symbol`, comparing case-insensitively.
///
/// Returns the symbol unchanged when none of `suffixes` match.
#[must_use]
pub fn strip_suffix<'a, S: AsRef<str>>(symbol: &'a str, suffixes: &[S]) -> &'a str {
    for suffix in suffixes {
        let suffix = suffix.as_ref();
        if suffix.is_empty() || symbol.len() <= suffix.len() {
            continue;
        }
        let split = symbol.len() - suffix.len();
        if symbol.is_char_boundary(split) && symbol[split..].eq_ignore_ascii_case(suffix) {
            return &symbol[..split];
        }
    }
    symbol
}

/// Whether `symbol` ends with one of `suffixes`, returning its position in the list.
#[must_use]
pub fn suffix_rank<S: AsRef<str>>(symbol: &str, suffixes: &[S]) -> Option<usize> {
    suffixes.iter().position(|suffix| {
        let suffix = suffix.as_ref();
        !suffix.is_empty()
            && symbol.len() > suffix.len()
            && symbol.is_char_boundary(symbol.len() - suffix.len())
            && symbol[symbol.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    })
}

/// `tick:{symbol}`
#[must_use]
pub fn tick_key(symbol: &str) -> String {
    format!("{TICK_PREFIX}{symbol}")
}

/// `stock:{symbol}`
#[must_use]
pub fn stock_key(symbol: &str) -> String {
    format!("{STOCK_PREFIX}{symbol}")
}

/// `history:{symbol}:{range}:{interval}`
#[must_use]
pub fn history_key(symbol: &str, range: &str, interval: &str) -> String {
    format!("{HISTORY_PREFIX}{symbol}:{range}:{interval}")
}

/// `search:{query}` with the query lowercased.
#[must_use]
pub fn search_key(query: &str) -> String {
    format!("{SEARCH_PREFIX}{}", query.to_lowercase())
}

/// `resolve:{input}`
#[must_use]
pub fn resolve_key(input: &str) -> String {
    format!("{RESOLVE_PREFIX}{input}")
}
