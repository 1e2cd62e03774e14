use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info_span;

use crate::inputs::{normalize_plan, BrandDefaults, NormalizedAssumptions, NormalizedPlan, PlanInput, StartupCostLineItem};
use crate::projection::{project_plan, EngineOutput};
use crate::scenarios::sensitivity::SensitivityKnobs;
use crate::types::*;
use crate::ProjectionResult;

/// Year-uniform perturbation of a plan. Percent shifts scale a value by
/// `(1 + f)`; `cogs_pp` adds percentage points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioShifts {
    pub revenue_pct: Rate,
    pub cogs_pp: Rate,
    pub labor_pct: Rate,
    pub marketing_pct: Rate,
    pub facilities_pct: Rate,
}

pub const CONSERVATIVE: ScenarioShifts = ScenarioShifts {
    revenue_pct: dec!(-0.15),
    cogs_pp: dec!(0.02),
    labor_pct: dec!(0.05),
    marketing_pct: dec!(0.10),
    facilities_pct: dec!(0.05),
};

pub const OPTIMISTIC: ScenarioShifts = ScenarioShifts {
    revenue_pct: dec!(0.10),
    cogs_pp: dec!(-0.01),
    labor_pct: dec!(-0.03),
    marketing_pct: dec!(0),
    facilities_pct: dec!(0),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Base,
    Conservative,
    Optimistic,
    Custom,
}

/// Headline figures for one scenario and how far each moved from base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub scenario: ScenarioKind,
    pub shifts: ScenarioShifts,
    pub five_year_roi_pct: Rate,
    pub break_even_month: Option<u32>,
    pub year5_revenue: Cents,
    pub year5_ebitda: Cents,
    pub ending_cash: Cents,
    pub estimated_value: Cents,
    pub roi_deviation: Rate,
    /// Months later (positive) or earlier than base; `None` if either
    /// scenario never breaks even.
    pub break_even_deviation_months: Option<i64>,
    pub year5_revenue_deviation: Cents,
    pub year5_ebitda_deviation: Cents,
    pub ending_cash_deviation: Cents,
    pub estimated_value_deviation: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub base: EngineOutput,
    pub conservative: EngineOutput,
    pub optimistic: EngineOutput,
    pub custom: Option<EngineOutput>,
    pub metrics: Vec<ScenarioMetrics>,
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Return a shifted copy of `base`; `base` itself is left untouched.
pub fn apply_shifts(base: &NormalizedAssumptions, shifts: &ScenarioShifts) -> NormalizedAssumptions {
    let mut shifted = base.clone();

    shifted.monthly_auv = scale_cents(base.monthly_auv, shifts.revenue_pct);
    for y in 0..YEARS {
        shifted.cogs_pct[y] = (base.cogs_pct[y] + shifts.cogs_pp).max(Decimal::ZERO);
        shifted.labor_pct[y] = base.labor_pct[y] * (Decimal::ONE + shifts.labor_pct);
        shifted.marketing_pct[y] = base.marketing_pct[y] * (Decimal::ONE + shifts.marketing_pct);
        shifted.facilities_annual[y] = scale_cents(base.facilities_annual[y], shifts.facilities_pct);
    }

    shifted
}

fn scale_cents(amount: Cents, pct: Rate) -> Cents {
    apply_rate(amount, Decimal::ONE + pct)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Project base, conservative, optimistic and (optionally) custom variants
/// of the same plan side by side.
pub fn run_scenario_comparison(
    base: &NormalizedAssumptions,
    startup_costs: &[StartupCostLineItem],
    custom: Option<&ScenarioShifts>,
) -> ScenarioComparison {
    let span = info_span!("scenario_comparison", custom = custom.is_some());
    let _guard = span.enter();

    let run = |shifts: &ScenarioShifts| {
        project_plan(&NormalizedPlan {
            assumptions: apply_shifts(base, shifts),
            startup_costs: startup_costs.to_vec(),
            advisories: Vec::new(),
        })
    };

    let neutral = ScenarioShifts::default();
    let base_output = run(&neutral);
    let conservative = run(&CONSERVATIVE);
    let optimistic = run(&OPTIMISTIC);
    let custom_output = custom.map(run);

    let mut metrics = vec![
        scenario_metrics(ScenarioKind::Base, neutral, &base_output, &base_output),
        scenario_metrics(ScenarioKind::Conservative, CONSERVATIVE, &conservative, &base_output),
        scenario_metrics(ScenarioKind::Optimistic, OPTIMISTIC, &optimistic, &base_output),
    ];
    if let (Some(shifts), Some(output)) = (custom, &custom_output) {
        metrics.push(scenario_metrics(ScenarioKind::Custom, *shifts, output, &base_output));
    }

    ScenarioComparison {
        base: base_output,
        conservative,
        optimistic,
        custom: custom_output,
        metrics,
    }
}

/// Normalize a plan snapshot, turn slider knobs into a custom scenario and
/// run the comparison inside the standard output envelope.
pub fn run_scenarios(
    input: &PlanInput,
    brand: Option<&BrandDefaults>,
    knobs: Option<&SensitivityKnobs>,
) -> ProjectionResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();

    let plan = normalize_plan(input, brand)?;
    let custom = knobs.map(SensitivityKnobs::to_shifts).transpose()?;
    let comparison = run_scenario_comparison(&plan.assumptions, &plan.startup_costs, custom.as_ref());

    let mut warnings = plan.advisories.clone();
    for (kind, output) in [
        (ScenarioKind::Conservative, &comparison.conservative),
        (ScenarioKind::Optimistic, &comparison.optimistic),
    ] {
        if !output.all_checks_passed() {
            warnings.push(format!("{kind:?} scenario has failing identity checks"));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Base / Conservative / Optimistic Scenario Comparison",
        &serde_json::json!({
            "conservative": CONSERVATIVE,
            "optimistic": OPTIMISTIC,
            "custom": custom,
        }),
        warnings,
        elapsed,
        comparison,
    ))
}

fn scenario_metrics(
    scenario: ScenarioKind,
    shifts: ScenarioShifts,
    output: &EngineOutput,
    base: &EngineOutput,
) -> ScenarioMetrics {
    let year5 = |o: &EngineOutput| {
        o.annual_summaries
            .last()
            .map_or((0, 0), |y| (y.revenue, y.ebitda))
    };
    let ending_cash = |o: &EngineOutput| o.monthly_projections.last().map_or(0, |m| m.ending_cash);

    let (year5_revenue, year5_ebitda) = year5(output);
    let (base_revenue, base_ebitda) = year5(base);
    let roi = output.roi_metrics.five_year_roi_pct;
    let break_even = output.roi_metrics.break_even_month;

    ScenarioMetrics {
        scenario,
        shifts,
        five_year_roi_pct: roi,
        break_even_month: break_even,
        year5_revenue,
        year5_ebitda,
        ending_cash: ending_cash(output),
        estimated_value: output.valuation.estimated_value,
        roi_deviation: roi - base.roi_metrics.five_year_roi_pct,
        break_even_deviation_months: break_even
            .zip(base.roi_metrics.break_even_month)
            .map(|(k, b)| i64::from(k) - i64::from(b)),
        year5_revenue_deviation: year5_revenue - base_revenue,
        year5_ebitda_deviation: year5_ebitda - base_ebitda,
        ending_cash_deviation: ending_cash(output) - ending_cash(base),
        estimated_value_deviation: output.valuation.estimated_value - base.valuation.estimated_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> NormalizedAssumptions {
        NormalizedAssumptions {
            monthly_auv: 500_000,
            cogs_pct: [dec!(0.30), dec!(0.30), dec!(0.29), dec!(0.29), dec!(0.28)],
            labor_pct: [dec!(0.25); YEARS],
            marketing_pct: [dec!(0.02); YEARS],
            facilities_annual: [3_600_000; YEARS],
            ..Default::default()
        }
    }

    #[test]
    fn test_conservative_shifts() {
        let shifted = apply_shifts(&base(), &CONSERVATIVE);
        assert_eq!(shifted.monthly_auv, 425_000);
        assert_eq!(shifted.cogs_pct[0], dec!(0.32));
        assert_eq!(shifted.cogs_pct[4], dec!(0.30));
        assert_eq!(shifted.labor_pct[0], dec!(0.2625));
        assert_eq!(shifted.marketing_pct[0], dec!(0.022));
        assert_eq!(shifted.facilities_annual[0], 3_780_000);
    }

    #[test]
    fn test_optimistic_shifts() {
        let shifted = apply_shifts(&base(), &OPTIMISTIC);
        assert_eq!(shifted.monthly_auv, 550_000);
        assert_eq!(shifted.cogs_pct[0], dec!(0.29));
        assert_eq!(shifted.labor_pct[0], dec!(0.2425));
        assert_eq!(shifted.facilities_annual, base().facilities_annual);
    }

    #[test]
    fn test_cogs_floor_at_zero() {
        let shifts = ScenarioShifts {
            cogs_pp: dec!(-0.50),
            ..Default::default()
        };
        let shifted = apply_shifts(&base(), &shifts);
        assert!(shifted.cogs_pct.iter().all(|c| c.is_zero()));
    }

    #[test]
    fn test_neutral_shift_is_identity() {
        let b = base();
        assert_eq!(apply_shifts(&b, &ScenarioShifts::default()), b);
    }

    #[test]
    fn test_base_untouched() {
        let b = base();
        let before = b.clone();
        let _ = run_scenario_comparison(&b, &[], Some(&CONSERVATIVE));
        assert_eq!(b, before);
    }

    #[test]
    fn test_metrics_rows() {
        let comparison = run_scenario_comparison(&base(), &[], None);
        assert_eq!(comparison.metrics.len(), 3);
        assert!(comparison.custom.is_none());
        assert_eq!(comparison.metrics[0].scenario, ScenarioKind::Base);
        assert_eq!(comparison.metrics[0].roi_deviation, Decimal::ZERO);
        assert_eq!(comparison.metrics[0].year5_revenue_deviation, 0);
        assert!(comparison.metrics[1].year5_revenue_deviation < 0);
        assert!(comparison.metrics[2].year5_revenue_deviation > 0);
    }
}
