use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inputs::{CapexClassification, NormalizedAssumptions, StartupCostTotals};
use crate::types::*;

/// A capitalized cost depreciated straight-line from its in-service month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciableAsset {
    pub label: String,
    pub cost: Cents,
    pub in_service_month: u32,
    pub life_months: u32,
}

impl DepreciableAsset {
    fn life_month(&self, month: u32) -> u32 {
        if month < self.in_service_month {
            0
        } else {
            month - self.in_service_month + 1
        }
    }

    /// Depreciation charged in a 1-based projection month; zero before the
    /// asset is placed in service and after its life ends.
    pub fn depreciation_for_month(&self, month: u32) -> Cents {
        pro_rata_slice(self.cost, self.life_months, self.life_month(month))
    }

    /// Accumulated depreciation through the end of `month`.
    pub fn accumulated_through(&self, month: u32) -> Cents {
        cumulative_pro_rata(self.cost, self.life_months, self.life_month(month))
    }

    /// Sum of every monthly charge over the full useful life. The slices
    /// telescope, so this is the running total at the last life month.
    pub fn full_life_total(&self) -> Cents {
        cumulative_pro_rata(self.cost, self.life_months, self.life_months)
    }
}

/// Useful life in months: `round(years × 12)`, at least one month and
/// saturating at `u32::MAX` for lives too long to count.
pub fn life_months(depreciation_years: Decimal) -> u32 {
    let Some(months) = depreciation_years.checked_mul(Decimal::from(MONTHS_PER_YEAR)) else {
        return u32::MAX;
    };
    if months <= Decimal::ZERO {
        return 1;
    }
    months.round().to_u32().unwrap_or(u32::MAX).max(1)
}

/// Startup CapEx placed in service in month 1, plus each year's
/// capitalized reinvestment placed in service in that year's first month.
pub fn build_asset_register(
    a: &NormalizedAssumptions,
    startup: &StartupCostTotals,
) -> Vec<DepreciableAsset> {
    let life = life_months(a.depreciation_years);
    let mut assets = Vec::new();

    if startup.capex != 0 {
        assets.push(DepreciableAsset {
            label: "Startup CapEx".into(),
            cost: startup.capex,
            in_service_month: 1,
            life_months: life,
        });
    }

    if a.reinvestment_classification == CapexClassification::Capex {
        for (idx, amount) in a.non_capex_investment.iter().enumerate() {
            if *amount != 0 {
                assets.push(DepreciableAsset {
                    label: format!("Year {} reinvestment", idx + 1),
                    cost: *amount,
                    in_service_month: idx as u32 * MONTHS_PER_YEAR + 1,
                    life_months: life,
                });
            }
        }
    }

    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asset() -> DepreciableAsset {
        DepreciableAsset {
            label: "Equipment".into(),
            cost: 15_000_001,
            in_service_month: 13,
            life_months: 120,
        }
    }

    #[test]
    fn test_life_months() {
        assert_eq!(life_months(dec!(10)), 120);
        assert_eq!(life_months(dec!(7.5)), 90);
        assert_eq!(life_months(Decimal::ZERO), 1);
    }

    #[test]
    fn test_very_long_life_saturates() {
        assert_eq!(life_months(dec!(400000000)), u32::MAX);
        assert_eq!(life_months(Decimal::MAX), u32::MAX);

        let a = DepreciableAsset {
            cost: 14_000_000,
            in_service_month: 1,
            life_months: life_months(dec!(400000000)),
            ..asset()
        };
        assert_eq!(a.depreciation_for_month(1), 0);
        assert!(a.accumulated_through(60) < 1_000);
        assert_eq!(a.full_life_total(), 14_000_000);
    }

    #[test]
    fn test_full_life_matches_monthly_slices() {
        let a = DepreciableAsset {
            life_months: 7,
            ..asset()
        };
        let summed: Cents = (1..=7).map(|k| pro_rata_slice(a.cost, 7, k)).sum();
        assert_eq!(a.full_life_total(), summed);
    }

    #[test]
    fn test_no_depreciation_before_in_service() {
        let a = asset();
        assert_eq!(a.depreciation_for_month(12), 0);
        assert_eq!(a.accumulated_through(12), 0);
        assert!(a.depreciation_for_month(13) > 0);
    }

    #[test]
    fn test_full_life_equals_cost() {
        assert_eq!(asset().full_life_total(), 15_000_001);
    }

    #[test]
    fn test_zero_after_life_ends() {
        let a = DepreciableAsset {
            life_months: 24,
            ..asset()
        };
        assert_eq!(a.depreciation_for_month(37), 0);
        assert_eq!(a.accumulated_through(60), a.cost);
    }

    #[test]
    fn test_register_capitalizes_reinvestment() {
        let a = NormalizedAssumptions {
            depreciation_years: dec!(10),
            non_capex_investment: [0, 0, 2_500_000, 0, 0],
            ..Default::default()
        };
        let startup = StartupCostTotals {
            capex: 10_000_000,
            ..Default::default()
        };
        let register = build_asset_register(&a, &startup);
        assert_eq!(register.len(), 2);
        assert_eq!(register[1].in_service_month, 25);

        let expensed = NormalizedAssumptions {
            reinvestment_classification: CapexClassification::NonCapex,
            ..a
        };
        assert_eq!(build_asset_register(&expensed, &startup).len(), 1);
    }
}
