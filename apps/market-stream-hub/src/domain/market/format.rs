//! Numeric presentation helpers.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, halves away from zero.
///
/// Rounds the exact binary value, so `1.005` (stored as `1.00499...`)
/// becomes `1.0`. Non-finite input is returned unchanged.
#[must_use]
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Thresholds in descending order: trillion, crore, lakh, thousand.
const SCALES: [(f64, &str); 4] = [(1e12, "T"), (1e7, "Cr"), (1e5, "L"), (1e3, "K")];

/// Format a large figure with Indian-style units.
///
/// `>= 1e12` prints as `T`, `>= 1e7` as `Cr`, `>= 1e5` as `L`, `>= 1e3` as
/// `K`, each with two decimals. Smaller values print as-is. Missing, zero or
/// NaN values print as `-`.
#[must_use]
pub fn format_large_number(value: Option<f64>) -> String {
    let Some(num) = value.filter(|n| *n != 0.0 && !n.is_nan()) else {
        return "-".to_string();
    };

    for (scale, unit) in SCALES {
        if num >= scale {
            return format!("{}{unit}", fixed2(num / scale));
        }
    }

    num.to_string()
}

fn fixed2(value: f64) -> String {
    Decimal::from_f64(value).map_or_else(
        || format!("{value:.2}"),
        |d| {
            let mut d = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            d.rescale(2);
            d.to_string()
        },
    )
}
