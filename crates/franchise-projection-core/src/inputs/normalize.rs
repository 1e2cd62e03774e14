use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::debug;

use crate::error::ProjectionError;
use crate::inputs::assumptions::{FacilitiesBreakdown, PlanInput};
use crate::inputs::brand_defaults::BrandDefaults;
use crate::inputs::field_value::{FieldValue, PerYearField};
use crate::inputs::startup_costs::{validate_startup_costs, CapexClassification, StartupCostLineItem};
use crate::types::{Cents, Days, Multiple, PerYear, Rate, YEARS};
use crate::ProjectionResult;

/// Fully-resolved assumptions consumed by the simulator. No optional
/// fields; per-year values are plain arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAssumptions {
    pub monthly_auv: Cents,
    pub growth_rates: PerYear<Rate>,
    pub starting_month_auv_pct: Rate,

    pub cogs_pct: PerYear<Rate>,
    pub labor_pct: PerYear<Rate>,
    pub marketing_pct: PerYear<Rate>,
    pub royalty_pct: PerYear<Rate>,
    pub ad_fund_pct: PerYear<Rate>,
    pub payroll_tax_pct: PerYear<Rate>,
    pub other_opex_pct: PerYear<Rate>,
    pub facilities_annual: PerYear<Cents>,
    pub management_salaries_annual: PerYear<Cents>,

    pub target_pretax_profit_pct: PerYear<Rate>,
    pub shareholder_salary_adj: PerYear<Cents>,
    pub distributions: PerYear<Cents>,
    pub non_capex_investment: PerYear<Cents>,
    pub reinvestment_classification: CapexClassification,
    pub tax_rate: Rate,

    pub ar_days: Days,
    pub ap_days: Days,
    pub inventory_days: Days,
    pub tax_payment_delay_months: u32,
    pub ebitda_multiple: Multiple,

    pub loan_amount: Cents,
    pub interest_rate: Rate,
    pub loan_term_months: u32,
    pub down_payment_pct: Rate,

    pub working_capital_months: Decimal,
    pub depreciation_years: Decimal,
}

/// Engine-ready plan: resolved assumptions, ordered startup costs and the
/// advisories raised while resolving them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlan {
    pub assumptions: NormalizedAssumptions,
    pub startup_costs: Vec<StartupCostLineItem>,
    pub advisories: Vec<String>,
}

/// Expand a sparse plan snapshot into a complete assumption set.
///
/// Missing values resolve to the field's own brand default, then to the
/// explicit `brand` baseline, then to zero. Item 7 ranges are reported,
/// never enforced. Errors are limited to caller contract violations:
/// per-year arrays of the wrong length, negative counts, and malformed
/// startup-cost schedules.
pub fn normalize_plan(
    input: &PlanInput,
    brand: Option<&BrandDefaults>,
) -> ProjectionResult<NormalizedPlan> {
    let base = brand.map(|b| &b.assumptions);
    let fi = &input.financial_inputs;
    let mut r = Resolver::default();

    let revenue = &fi.revenue;
    let costs = &fi.operating_costs;
    let profit = &fi.profitability;
    let wc = &fi.working_capital;
    let financing = &fi.financing;
    let capital = &fi.startup_capital;

    let facilities_annual = match &costs.facilities_breakdown {
        Some(breakdown) => r.facilities_from_breakdown(breakdown)?,
        None => r.per_year(
            "operating_costs.facilities_annual",
            &costs.facilities_annual,
            base.map(|b| &b.facilities_annual),
        )?,
    };

    let assumptions = NormalizedAssumptions {
        monthly_auv: r.scalar("revenue.monthly_auv", &revenue.monthly_auv, base.map(|b| b.monthly_auv)),
        growth_rates: r.per_year(
            "revenue.growth_rates",
            &revenue.growth_rates,
            base.map(|b| &b.growth_rates),
        )?,
        starting_month_auv_pct: r.scalar(
            "revenue.starting_month_auv_pct",
            &revenue.starting_month_auv_pct,
            base.map(|b| b.starting_month_auv_pct),
        ),
        cogs_pct: r.per_year("operating_costs.cogs_pct", &costs.cogs_pct, base.map(|b| &b.cogs_pct))?,
        labor_pct: r.per_year("operating_costs.labor_pct", &costs.labor_pct, base.map(|b| &b.labor_pct))?,
        marketing_pct: r.per_year(
            "operating_costs.marketing_pct",
            &costs.marketing_pct,
            base.map(|b| &b.marketing_pct),
        )?,
        royalty_pct: r.per_year(
            "operating_costs.royalty_pct",
            &costs.royalty_pct,
            base.map(|b| &b.royalty_pct),
        )?,
        ad_fund_pct: r.per_year(
            "operating_costs.ad_fund_pct",
            &costs.ad_fund_pct,
            base.map(|b| &b.ad_fund_pct),
        )?,
        payroll_tax_pct: r.per_year(
            "operating_costs.payroll_tax_pct",
            &costs.payroll_tax_pct,
            base.map(|b| &b.payroll_tax_pct),
        )?,
        other_opex_pct: r.per_year(
            "operating_costs.other_opex_pct",
            &costs.other_opex_pct,
            base.map(|b| &b.other_opex_pct),
        )?,
        facilities_annual,
        management_salaries_annual: r.per_year(
            "operating_costs.management_salaries_annual",
            &costs.management_salaries_annual,
            base.map(|b| &b.management_salaries_annual),
        )?,
        target_pretax_profit_pct: r.per_year(
            "profitability.target_pretax_profit_pct",
            &profit.target_pretax_profit_pct,
            base.map(|b| &b.target_pretax_profit_pct),
        )?,
        shareholder_salary_adj: r.per_year(
            "profitability.shareholder_salary_adj",
            &profit.shareholder_salary_adj,
            base.map(|b| &b.shareholder_salary_adj),
        )?,
        distributions: r.per_year(
            "profitability.distributions",
            &profit.distributions,
            base.map(|b| &b.distributions),
        )?,
        non_capex_investment: r.per_year(
            "profitability.non_capex_investment",
            &profit.non_capex_investment,
            base.map(|b| &b.non_capex_investment),
        )?,
        reinvestment_classification: profit.reinvestment_classification,
        tax_rate: r.scalar("profitability.tax_rate", &profit.tax_rate, base.map(|b| b.tax_rate)),
        ar_days: non_negative(
            "working_capital.ar_days",
            r.scalar("working_capital.ar_days", &wc.ar_days, base.map(|b| b.ar_days)),
        )?,
        ap_days: non_negative(
            "working_capital.ap_days",
            r.scalar("working_capital.ap_days", &wc.ap_days, base.map(|b| b.ap_days)),
        )?,
        inventory_days: non_negative(
            "working_capital.inventory_days",
            r.scalar(
                "working_capital.inventory_days",
                &wc.inventory_days,
                base.map(|b| b.inventory_days),
            ),
        )?,
        tax_payment_delay_months: whole_months(
            "working_capital.tax_payment_delay_months",
            r.scalar(
                "working_capital.tax_payment_delay_months",
                &wc.tax_payment_delay_months,
                base.map(|b| Decimal::from(b.tax_payment_delay_months)),
            ),
        )?,
        ebitda_multiple: r.scalar(
            "working_capital.ebitda_multiple",
            &wc.ebitda_multiple,
            base.map(|b| b.ebitda_multiple),
        ),
        loan_amount: r.scalar("financing.loan_amount", &financing.loan_amount, base.map(|b| b.loan_amount)),
        interest_rate: r.scalar(
            "financing.interest_rate",
            &financing.interest_rate,
            base.map(|b| b.interest_rate),
        ),
        loan_term_months: whole_months(
            "financing.loan_term_months",
            r.scalar(
                "financing.loan_term_months",
                &financing.loan_term_months,
                base.map(|b| Decimal::from(b.loan_term_months)),
            ),
        )?,
        down_payment_pct: r.scalar(
            "financing.down_payment_pct",
            &financing.down_payment_pct,
            base.map(|b| b.down_payment_pct),
        ),
        working_capital_months: non_negative(
            "startup_capital.working_capital_months",
            r.scalar(
                "startup_capital.working_capital_months",
                &capital.working_capital_months,
                base.map(|b| b.working_capital_months),
            ),
        )?,
        depreciation_years: non_negative(
            "startup_capital.depreciation_years",
            r.scalar(
                "startup_capital.depreciation_years",
                &capital.depreciation_years,
                base.map(|b| b.depreciation_years),
            ),
        )?,
    };

    let mut advisories = r.advisories;
    advisories.extend(validate_startup_costs(&input.startup_costs)?);

    let mut startup_costs = input.startup_costs.clone();
    startup_costs.sort_by_key(|item| item.sort_order);

    debug!(
        startup_items = startup_costs.len(),
        advisories = advisories.len(),
        "normalized plan inputs"
    );

    Ok(NormalizedPlan {
        assumptions,
        startup_costs,
        advisories,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolves fields and accumulates item 7 advisories along the way.
#[derive(Default)]
struct Resolver {
    advisories: Vec<String>,
}

impl Resolver {
    fn scalar<T>(&mut self, label: &str, field: &FieldValue<T>, fallback: Option<T>) -> T
    where
        T: Copy + Default + PartialEq + PartialOrd + Display,
    {
        let value = field.resolve(fallback);
        if let Some(advisory) = field.item7_advisory(label, &value) {
            self.advisories.push(advisory);
        }
        value
    }

    fn per_year<T>(
        &mut self,
        label: &str,
        field: &PerYearField<T>,
        fallback: Option<&PerYear<T>>,
    ) -> ProjectionResult<PerYear<T>>
    where
        T: Copy + Default + PartialEq + PartialOrd + Display,
    {
        let values = field.resolve(label, fallback)?;
        for (idx, value) in values.iter().enumerate() {
            let advisory = field
                .field_for_year(idx)
                .and_then(|f| f.item7_advisory(&format!("{label} year {}", idx + 1), value));
            if let Some(advisory) = advisory {
                self.advisories.push(advisory);
            }
        }
        Ok(values)
    }

    fn facilities_from_breakdown(
        &mut self,
        breakdown: &FacilitiesBreakdown,
    ) -> ProjectionResult<PerYear<Cents>> {
        let lines = [
            ("operating_costs.facilities_breakdown.rent", &breakdown.rent),
            ("operating_costs.facilities_breakdown.utilities", &breakdown.utilities),
            ("operating_costs.facilities_breakdown.telecom", &breakdown.telecom),
            ("operating_costs.facilities_breakdown.vehicle", &breakdown.vehicle),
            ("operating_costs.facilities_breakdown.insurance", &breakdown.insurance),
        ];
        let mut total = [0; YEARS];
        for (label, field) in lines {
            let values = self.per_year(label, field, None)?;
            for (slot, value) in total.iter_mut().zip(values) {
                *slot += value;
            }
        }
        Ok(total)
    }
}

fn non_negative(field: &str, value: Decimal) -> ProjectionResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(ProjectionError::InvalidInput {
            field: field.into(),
            reason: format!("Value must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

fn whole_months(field: &str, value: Decimal) -> ProjectionResult<u32> {
    let value = non_negative(field, value)?;
    value.round().to_u32().ok_or_else(|| ProjectionError::InvalidInput {
        field: field.into(),
        reason: format!("Month count {value} is out of range"),
    })
}
