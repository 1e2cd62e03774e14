use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Currency in integer minor units (cents). Never a float.
pub type Cents = i64;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 3.5x EBITDA)
pub type Multiple = Decimal;

/// Day counts (AR/AP/inventory days)
pub type Days = Decimal;

/// One value per projection year.
pub type PerYear<T> = [T; YEARS];

/// Projection horizon in years
pub const YEARS: usize = 5;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Projection horizon in months
pub const MONTHS: u32 = YEARS as u32 * MONTHS_PER_YEAR;

/// Day-count convention for working capital balances (30/360).
pub const DAYS_PER_MONTH: Decimal = dec!(30);

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "integer_cents_with_rust_decimal_rates".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Cents arithmetic
// ---------------------------------------------------------------------------

/// Round a decimal amount of cents to whole cents, half away from zero.
/// Saturates at the `i64` bounds.
pub fn to_cents(value: Decimal) -> Cents {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// `amount × rate`, rounded to whole cents.
pub fn apply_rate(amount: Cents, rate: Rate) -> Cents {
    to_cents(Decimal::from(amount) * rate)
}

/// Slice `index` (1-based) of `total` split across `periods` equal parts.
///
/// Computed as `floor(total·i/n) − floor(total·(i−1)/n)`, so the slices sum
/// to `total` exactly and the running sum after `i` slices never differs
/// from `total·i/n` by a full cent. Indices outside `1..=periods` get 0.
pub fn pro_rata_slice(total: Cents, periods: u32, index: u32) -> Cents {
    if periods == 0 || index == 0 || index > periods {
        return 0;
    }
    cumulative_pro_rata(total, periods, index) - cumulative_pro_rata(total, periods, index - 1)
}

/// Running sum of the first `index` slices of `total` over `periods`.
pub fn cumulative_pro_rata(total: Cents, periods: u32, index: u32) -> Cents {
    if periods == 0 {
        return 0;
    }
    let index = index.min(periods);
    let scaled = i128::from(total) * i128::from(index);
    scaled.div_euclid(i128::from(periods)) as Cents
}

pub fn safe_divide(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Ratio of two cent amounts as a decimal; 0 when the denominator is 0.
pub fn cents_ratio(numerator: Cents, denominator: Cents) -> Decimal {
    safe_divide(Decimal::from(numerator), Decimal::from(denominator))
}

/// Projection year (1-based) of a 1-based month index.
pub fn year_of_month(month: u32) -> usize {
    ((month - 1) / MONTHS_PER_YEAR) as usize + 1
}

/// Month within its year (1..=12) of a 1-based month index.
pub fn month_in_year(month: u32) -> u32 {
    (month - 1) % MONTHS_PER_YEAR + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cents_rounds_half_away_from_zero() {
        assert_eq!(to_cents(dec!(10.5)), 11);
        assert_eq!(to_cents(dec!(-10.5)), -11);
        assert_eq!(to_cents(dec!(10.49)), 10);
    }

    #[test]
    fn test_apply_rate() {
        assert_eq!(apply_rate(500_000, dec!(0.30)), 150_000);
        assert_eq!(apply_rate(333, dec!(0.5)), 167);
    }

    #[test]
    fn test_pro_rata_slices_sum_to_total() {
        for total in [0, 1, 11, 3_600_000, 1_000_001, -7_777] {
            let sum: Cents = (1..=12).map(|i| pro_rata_slice(total, 12, i)).sum();
            assert_eq!(sum, total, "slices of {total} should sum back");
        }
    }

    #[test]
    fn test_pro_rata_running_sum_stays_within_a_cent() {
        let total = 15_000_000;
        let periods = 120;
        let mut running = 0;
        for i in 1..=periods {
            running += pro_rata_slice(total, periods, i);
            let exact = Decimal::from(total) * Decimal::from(i) / Decimal::from(periods);
            assert!((Decimal::from(running) - exact).abs() < Decimal::ONE);
        }
    }

    #[test]
    fn test_pro_rata_out_of_range_index() {
        assert_eq!(pro_rata_slice(1200, 12, 0), 0);
        assert_eq!(pro_rata_slice(1200, 12, 13), 0);
        assert_eq!(pro_rata_slice(1200, 0, 1), 0);
    }

    #[test]
    fn test_month_indexing() {
        assert_eq!(year_of_month(1), 1);
        assert_eq!(year_of_month(12), 1);
        assert_eq!(year_of_month(13), 2);
        assert_eq!(year_of_month(60), 5);
        assert_eq!(month_in_year(13), 1);
        assert_eq!(month_in_year(60), 12);
    }

    #[test]
    fn test_cents_ratio_zero_denominator() {
        assert_eq!(cents_ratio(100, 0), Decimal::ZERO);
        assert_eq!(cents_ratio(50, 200), dec!(0.25));
    }
}
