//! Service-level errors.

use crate::application::ports::ProviderError;
use crate::domain::market::period::UnknownInterval;

/// Errors surfaced by the lookup services.
///
/// Cache failures never appear here; they are absorbed as misses.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// Caller input rejected before any upstream call.
    #[error("{0}")]
    Validation(String),

    /// Provider failed and no fallback applied.
    #[error("upstream error: {0}")]
    Upstream(#[from] ProviderError),
}

impl ServiceError {
    /// Whether the caller is at fault.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<UnknownInterval> for ServiceError {
    fn from(err: UnknownInterval) -> Self {
        Self::Validation(err.to_string())
    }
}
