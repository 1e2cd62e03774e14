use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::inputs::NormalizedAssumptions;
use crate::projection::annual::AnnualSummary;
use crate::projection::monthly::{MonthlyProjection, OpeningPosition};
use crate::types::*;

/// Broker, legal and closing costs on a sale, as a share of enterprise value.
pub const TRANSACTION_COST_PCT: Rate = dec!(0.06);

/// Tax on the gain over the book value of fixed assets.
pub const CAPITAL_GAINS_TAX_RATE: Rate = dec!(0.20);

// ---------------------------------------------------------------------------
// ROI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiMetrics {
    pub total_startup_investment: Cents,
    pub equity_contribution: Cents,
    pub loan_principal: Cents,
    pub working_capital_reserve: Cents,
    pub opening_cash: Cents,
    /// First month with non-negative cumulative cash flow; `None` if the
    /// owner is still out of pocket after month 60.
    pub break_even_month: Option<u32>,
    pub five_year_cumulative_cash_flow: Cents,
    pub five_year_roi_pct: Rate,
}

/// First 1-based month whose cumulative net cash flow is ≥ 0.
pub fn break_even_month(months: &[MonthlyProjection]) -> Option<u32> {
    months
        .iter()
        .find(|m| m.cumulative_net_cash_flow >= 0)
        .map(|m| m.month)
}

pub fn roi_metrics(opening: &OpeningPosition, months: &[MonthlyProjection]) -> RoiMetrics {
    let five_year_cumulative_cash_flow = months
        .last()
        .map_or(-opening.equity_contribution, |m| m.cumulative_net_cash_flow);

    RoiMetrics {
        total_startup_investment: opening.total_startup_investment,
        equity_contribution: opening.equity_contribution,
        loan_principal: opening.loan_principal,
        working_capital_reserve: opening.working_capital_reserve,
        opening_cash: opening.opening_cash,
        break_even_month: break_even_month(months),
        five_year_cumulative_cash_flow,
        five_year_roi_pct: cents_ratio(
            five_year_cumulative_cash_flow,
            opening.total_startup_investment,
        ),
    }
}

// ---------------------------------------------------------------------------
// ROIC
// ---------------------------------------------------------------------------

/// Return on invested capital for one year, with and without the owner's
/// sweat equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoicYear {
    pub year: u32,
    pub equity_contribution: Cents,
    pub loan_balance: Cents,
    pub cumulative_sweat_equity: Cents,
    pub retained_earnings: Cents,
    pub total_invested_capital: Cents,
    pub pretax_income: Cents,
    pub shareholder_salary_adj: Cents,
    pub pretax_income_incl_sweat_equity: Cents,
    pub after_tax_income: Cents,
    pub roic_pct: Rate,
    pub after_tax_roic_pct: Rate,
    pub ending_cash: Cents,
    pub avg_monthly_operating_cost: Cents,
    pub core_capital_months: Decimal,
}

pub fn roic_extended(opening: &OpeningPosition, annual: &[AnnualSummary]) -> Vec<RoicYear> {
    let mut cumulative_sweat_equity = 0;

    annual
        .iter()
        .map(|y| {
            cumulative_sweat_equity += y.sweat_equity_adjustment;

            let total_invested_capital = opening.equity_contribution
                + y.loan_balance
                + cumulative_sweat_equity
                + y.retained_earnings;
            let pretax_income_incl_sweat_equity = y.pretax_income + y.sweat_equity_adjustment;

            let (roic_pct, after_tax_roic_pct) = if total_invested_capital > 0 {
                (
                    cents_ratio(pretax_income_incl_sweat_equity, total_invested_capital),
                    cents_ratio(y.net_income, total_invested_capital),
                )
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };

            let monthly_cost =
                Decimal::from(y.total_cogs + y.total_opex) / Decimal::from(MONTHS_PER_YEAR);
            let core_capital_months = safe_divide(Decimal::from(y.ending_cash), monthly_cost);

            RoicYear {
                year: y.year,
                equity_contribution: opening.equity_contribution,
                loan_balance: y.loan_balance,
                cumulative_sweat_equity,
                retained_earnings: y.retained_earnings,
                total_invested_capital,
                pretax_income: y.pretax_income,
                shareholder_salary_adj: y.sweat_equity_adjustment,
                pretax_income_incl_sweat_equity,
                after_tax_income: y.net_income,
                roic_pct,
                after_tax_roic_pct,
                ending_cash: y.ending_cash,
                avg_monthly_operating_cost: to_cents(monthly_cost),
                core_capital_months,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Exit value if the business were sold at the end of a given year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationYear {
    pub year: u32,
    pub ebitda: Cents,
    pub shareholder_salary_adj: Cents,
    pub adjusted_noi: Cents,
    pub ebitda_multiple: Multiple,
    pub estimated_value: Cents,
    pub transaction_costs: Cents,
    pub net_fixed_assets: Cents,
    pub taxable_gain: Cents,
    pub capital_gains_tax: Cents,
    pub loan_balance: Cents,
    pub net_after_tax_proceeds: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub ebitda_multiple: Multiple,
    pub transaction_cost_pct: Rate,
    pub capital_gains_tax_rate: Rate,
    pub by_year: Vec<ValuationYear>,
    /// Year-5 figures
    pub adjusted_noi: Cents,
    pub estimated_value: Cents,
    pub net_after_tax_proceeds: Cents,
    /// (five-year cumulative cash flow + exit proceeds) / startup investment
    pub total_return_pct: Rate,
}

/// Value one year: `adjusted NOI × multiple`, less selling costs, tax on
/// the gain over book and the loan payoff.
pub fn value_year(y: &AnnualSummary, ebitda_multiple: Multiple) -> ValuationYear {
    let adjusted_noi = y.ebitda + y.sweat_equity_adjustment;
    let estimated_value = to_cents(Decimal::from(adjusted_noi) * ebitda_multiple).max(0);
    let transaction_costs = apply_rate(estimated_value, TRANSACTION_COST_PCT);
    let taxable_gain = (estimated_value - transaction_costs - y.net_fixed_assets).max(0);
    let capital_gains_tax = apply_rate(taxable_gain, CAPITAL_GAINS_TAX_RATE);

    ValuationYear {
        year: y.year,
        ebitda: y.ebitda,
        shareholder_salary_adj: y.sweat_equity_adjustment,
        adjusted_noi,
        ebitda_multiple,
        estimated_value,
        transaction_costs,
        net_fixed_assets: y.net_fixed_assets,
        taxable_gain,
        capital_gains_tax,
        loan_balance: y.loan_balance,
        net_after_tax_proceeds: estimated_value
            - transaction_costs
            - capital_gains_tax
            - y.loan_balance,
    }
}

pub fn valuation(
    a: &NormalizedAssumptions,
    annual: &[AnnualSummary],
    roi: &RoiMetrics,
) -> ValuationOutput {
    let by_year: Vec<ValuationYear> = annual
        .iter()
        .map(|y| value_year(y, a.ebitda_multiple))
        .collect();

    let (adjusted_noi, estimated_value, net_after_tax_proceeds) = by_year
        .last()
        .map_or((0, 0, 0), |v| {
            (v.adjusted_noi, v.estimated_value, v.net_after_tax_proceeds)
        });

    ValuationOutput {
        ebitda_multiple: a.ebitda_multiple,
        transaction_cost_pct: TRANSACTION_COST_PCT,
        capital_gains_tax_rate: CAPITAL_GAINS_TAX_RATE,
        by_year,
        adjusted_noi,
        estimated_value,
        net_after_tax_proceeds,
        total_return_pct: cents_ratio(
            roi.five_year_cumulative_cash_flow + net_after_tax_proceeds,
            roi.total_startup_investment,
        ),
    }
}
