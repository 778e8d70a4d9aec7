//! Hub-driven upstream interest with pinned defaults.

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::ports::FeedInterest;
use crate::domain::market::symbol::canonicalize;

/// Forwards hub interest changes, except removals of pinned symbols.
///
/// The configured default symbols stay subscribed regardless of how many
/// clients are watching them.
pub struct PinnedInterest {
    inner: Arc<dyn FeedInterest>,
    pinned: HashSet<String>,
}

impl std::fmt::Debug for PinnedInterest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedInterest")
            .field("pinned", &self.pinned)
            .finish_non_exhaustive()
    }
}

impl PinnedInterest {
    /// Pin `symbols` on top of `inner`.
    #[must_use]
    pub fn new<S: AsRef<str>>(inner: Arc<dyn FeedInterest>, symbols: &[S]) -> Self {
        Self {
            inner,
            pinned: symbols.iter().map(|s| canonicalize(s.as_ref())).collect(),
        }
    }

    /// Whether `symbol` is pinned.
    #[must_use]
    pub fn is_pinned(&self, symbol: &str) -> bool {
        self.pinned.contains(&canonicalize(symbol))
    }

    fn unpinned(&self, symbols: &[String]) -> Vec<String> {
        symbols
            .iter()
            .filter(|s| !self.is_pinned(s))
            .cloned()
            .collect()
    }
}

impl FeedInterest for PinnedInterest {
    fn subscribe(&self, symbols: &[String]) {
        let symbols = self.unpinned(symbols);
        if !symbols.is_empty() {
            self.inner.subscribe(&symbols);
        }
    }

    fn unsubscribe(&self, symbols: &[String]) {
        let symbols = self.unpinned(symbols);
        if !symbols.is_empty() {
            self.inner.unsubscribe(&symbols);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(&'static str, Vec<String>)>>,
    }

    impl FeedInterest for Recorder {
        fn subscribe(&self, symbols: &[String]) {
            self.calls.lock().push(("sub", symbols.to_vec()));
        }

        fn unsubscribe(&self, symbols: &[String]) {
            self.calls.lock().push(("unsub", symbols.to_vec()));
        }
    }

    fn owned(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn pinned_symbols_are_never_unsubscribed() {
        let recorder = Arc::new(Recorder::default());
        let interest = PinnedInterest::new(recorder.clone(), &["TCS.NS", "infy.ns"]);

        interest.unsubscribe(&owned(&["TCS.NS", "INFY.NS"]));
        interest.unsubscribe(&owned(&["ITC.NS", "TCS.NS"]));

        assert_eq!(*recorder.calls.lock(), vec![("unsub", owned(&["ITC.NS"]))]);
    }

    #[test]
    fn extra_symbols_are_forwarded() {
        let recorder = Arc::new(Recorder::default());
        let interest = PinnedInterest::new(recorder.clone(), &["TCS.NS"]);

        interest.subscribe(&owned(&["TCS.NS"]));
        interest.subscribe(&owned(&["SBIN.NS"]));

        assert!(interest.is_pinned("tcs.ns"));
        assert_eq!(*recorder.calls.lock(), vec![("sub", owned(&["SBIN.NS"]))]);
    }
}
