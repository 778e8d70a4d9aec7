//! Reconnection Strategies
//!
//! The tick source asks a [`ReconnectStrategy`] how long to wait after each
//! dropped connection. Two strategies ship:
//!
//! - [`FixedDelay`]: the same delay every time, forever. The default.
//! - [`ExponentialBackoff`]: growing delay with jitter, a cap and an
//!   optional attempt limit.

use std::time::Duration;

use rand::Rng;

/// Decides the wait before the next connection attempt.
pub trait ReconnectStrategy: Send {
    /// Delay before the next attempt, or `None` to give up.
    fn next_delay(&mut self) -> Option<Duration>;

    /// Forget past failures after a successful connection.
    fn reset(&mut self);

    /// Attempts since the last reset.
    fn attempt_count(&self) -> u32;
}

/// Which strategy the tick source builds for each run.
#[derive(Debug, Clone)]
pub enum ReconnectSettings {
    /// Constant delay, unbounded attempts.
    Fixed(Duration),
    /// Exponential backoff with jitter.
    Exponential(BackoffConfig),
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self::Fixed(FixedDelay::DEFAULT_DELAY)
    }
}

impl ReconnectSettings {
    /// Build a fresh strategy.
    #[must_use]
    pub fn build(&self) -> Box<dyn ReconnectStrategy> {
        match self {
            Self::Fixed(delay) => Box::new(FixedDelay::new(*delay)),
            Self::Exponential(config) => Box::new(ExponentialBackoff::new(config.clone())),
        }
    }
}

// =============================================================================
// Fixed Delay
// =============================================================================

/// Constant delay, never gives up.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    attempt_count: u32,
}

impl FixedDelay {
    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    /// Create a fixed-delay strategy.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            attempt_count: 0,
        }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl ReconnectStrategy for FixedDelay {
    fn next_delay(&mut self) -> Option<Duration> {
        self.attempt_count = self.attempt_count.saturating_add(1);
        Some(self.delay)
    }

    fn reset(&mut self) {
        self.attempt_count = 0;
    }

    fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}

// =============================================================================
// Exponential Backoff
// =============================================================================

/// Configuration for exponential backoff.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay before the first attempt.
    pub initial_delay: Duration,
    /// Upper bound on any delay.
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%).
    pub jitter_factor: f64,
    /// Maximum attempts (0 = unlimited).
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(64),
            multiplier: 2.0,
            jitter_factor: 0.1,
            max_attempts: 0,
        }
    }
}

impl BackoffConfig {
    /// Backoff starting at `initial_delay` with the remaining defaults.
    #[must_use]
    pub fn starting_at(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay: Self::default().max_delay.max(initial_delay),
            ..Self::default()
        }
    }
}

/// Exponential backoff with jitter.
///
/// # Example
///
/// ```rust
/// use market_stream_hub::infrastructure::feed::{BackoffConfig, ExponentialBackoff, ReconnectStrategy};
///
/// let mut backoff = ExponentialBackoff::new(BackoffConfig::default());
/// assert!(backoff.next_delay().is_some());
/// backoff.reset();
/// assert_eq!(backoff.attempt_count(), 0);
/// ```
#[derive(Debug)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ExponentialBackoff {
    /// Create a new backoff strategy.
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Whether another attempt is allowed.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        self.config.max_attempts == 0 || self.attempt_count < self.config.max_attempts
    }

    fn grow(&self) -> Duration {
        #[allow(clippy::cast_precision_loss)]
        let scaled = (self.current_delay.as_millis() as f64 * self.config.multiplier).round();
        let next_millis = if scaled.is_finite() && scaled > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                scaled as u128
            }
        } else {
            0
        };
        let capped = next_millis.min(self.config.max_delay.as_millis());
        Duration::from_millis(u64::try_from(capped).unwrap_or(u64::MAX))
    }

    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 {
            return duration;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = duration.as_millis() as f64;
        let jitter_range = base_millis * self.config.jitter_factor;
        let jitter: f64 = rand::rng().random_range(-jitter_range..=jitter_range);
        let adjusted_millis = (base_millis + jitter).max(1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let adjusted_u64 = adjusted_millis as u64;
        Duration::from_millis(adjusted_u64)
    }
}

impl ReconnectStrategy for ExponentialBackoff {
    fn next_delay(&mut self) -> Option<Duration> {
        if !self.should_retry() {
            return None;
        }

        self.attempt_count += 1;
        let delay = self.apply_jitter(self.current_delay);
        self.current_delay = self.grow();
        Some(delay)
    }

    fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
