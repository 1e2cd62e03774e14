use serde::{Deserialize, Serialize};

use crate::inputs::NormalizedAssumptions;
use crate::projection::monthly::MonthlyProjection;
use crate::types::*;

/// Twelve months rolled up: summed flows plus the December balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    pub year: u32,

    // P&L
    pub revenue: Cents,
    pub cogs: Cents,
    pub royalty: Cents,
    pub ad_fund: Cents,
    pub total_cogs: Cents,
    pub gross_profit: Cents,
    pub gross_profit_pct: Rate,
    pub direct_labor: Cents,
    pub payroll_tax: Cents,
    pub management_salaries: Cents,
    pub facilities: Cents,
    pub marketing: Cents,
    pub other_opex: Cents,
    pub reinvestment_expense: Cents,
    pub total_opex: Cents,
    pub ebitda: Cents,
    pub ebitda_pct: Rate,
    pub depreciation: Cents,
    pub interest_expense: Cents,
    pub pretax_income: Cents,
    pub pretax_income_pct: Rate,
    pub target_pretax_income: Cents,
    pub pretax_income_vs_target: Cents,
    pub taxes: Cents,
    pub net_income: Cents,
    pub sweat_equity_adjustment: Cents,

    // Cash flow
    pub operating_cash_flow: Cents,
    pub capital_expenditure: Cents,
    pub investing_cash_flow: Cents,
    pub principal_payment: Cents,
    pub distributions: Cents,
    pub financing_cash_flow: Cents,
    pub net_cash_flow: Cents,
    pub beginning_cash: Cents,
    pub ending_cash: Cents,
    pub cumulative_net_cash_flow: Cents,

    // December balance sheet
    pub accounts_receivable: Cents,
    pub inventory: Cents,
    pub net_fixed_assets: Cents,
    pub total_assets: Cents,
    pub accounts_payable: Cents,
    pub taxes_payable: Cents,
    pub loan_balance: Cents,
    pub total_liabilities: Cents,
    pub retained_earnings: Cents,
    pub total_equity: Cents,
}

/// Roll 60 monthly records into one summary per year.
pub fn annualize(months: &[MonthlyProjection], a: &NormalizedAssumptions) -> Vec<AnnualSummary> {
    months
        .chunks(MONTHS_PER_YEAR as usize)
        .enumerate()
        .filter_map(|(idx, year)| summarize_year(idx, year, a))
        .collect()
}

fn summarize_year(
    idx: usize,
    months: &[MonthlyProjection],
    a: &NormalizedAssumptions,
) -> Option<AnnualSummary> {
    let first = months.first()?;
    let december = months.last()?;
    let sum = |f: fn(&MonthlyProjection) -> Cents| -> Cents { months.iter().map(f).sum() };

    let revenue = sum(|m| m.revenue);
    let gross_profit = sum(|m| m.gross_profit);
    let ebitda = sum(|m| m.ebitda);
    let pretax_income = sum(|m| m.pretax_income);
    let target_pct = a.target_pretax_profit_pct.get(idx).copied().unwrap_or_default();
    let target_pretax_income = apply_rate(revenue, target_pct);

    Some(AnnualSummary {
        year: idx as u32 + 1,
        revenue,
        cogs: sum(|m| m.cogs),
        royalty: sum(|m| m.royalty),
        ad_fund: sum(|m| m.ad_fund),
        total_cogs: sum(|m| m.total_cogs),
        gross_profit,
        gross_profit_pct: cents_ratio(gross_profit, revenue),
        direct_labor: sum(|m| m.direct_labor),
        payroll_tax: sum(|m| m.payroll_tax),
        management_salaries: sum(|m| m.management_salaries),
        facilities: sum(|m| m.facilities),
        marketing: sum(|m| m.marketing),
        other_opex: sum(|m| m.other_opex),
        reinvestment_expense: sum(|m| m.reinvestment_expense),
        total_opex: sum(|m| m.total_opex),
        ebitda,
        ebitda_pct: cents_ratio(ebitda, revenue),
        depreciation: sum(|m| m.depreciation),
        interest_expense: sum(|m| m.interest_expense),
        pretax_income,
        pretax_income_pct: cents_ratio(pretax_income, revenue),
        target_pretax_income,
        pretax_income_vs_target: pretax_income - target_pretax_income,
        taxes: sum(|m| m.taxes),
        net_income: sum(|m| m.net_income),
        sweat_equity_adjustment: sum(|m| m.sweat_equity_adjustment),
        operating_cash_flow: sum(|m| m.operating_cash_flow),
        capital_expenditure: sum(|m| m.capital_expenditure),
        investing_cash_flow: sum(|m| m.investing_cash_flow),
        principal_payment: sum(|m| m.principal_payment),
        distributions: sum(|m| m.distributions),
        financing_cash_flow: sum(|m| m.financing_cash_flow),
        net_cash_flow: sum(|m| m.net_cash_flow),
        beginning_cash: first.beginning_cash,
        ending_cash: december.ending_cash,
        cumulative_net_cash_flow: december.cumulative_net_cash_flow,
        accounts_receivable: december.accounts_receivable,
        inventory: december.inventory,
        net_fixed_assets: december.net_fixed_assets,
        total_assets: december.total_assets,
        accounts_payable: december.accounts_payable,
        taxes_payable: december.taxes_payable,
        loan_balance: december.loan_balance,
        total_liabilities: december.total_liabilities,
        retained_earnings: december.retained_earnings,
        total_equity: december.total_equity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{CapexClassification, StartupCostLineItem};
    use crate::projection::monthly::simulate_months;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn assumptions() -> NormalizedAssumptions {
        NormalizedAssumptions {
            monthly_auv: 500_000,
            growth_rates: [dec!(0), dec!(0.05), dec!(0.03), dec!(0.03), dec!(0.03)],
            starting_month_auv_pct: dec!(0.6),
            cogs_pct: [dec!(0.30); YEARS],
            labor_pct: [dec!(0.25); YEARS],
            facilities_annual: [3_600_000; YEARS],
            target_pretax_profit_pct: [dec!(0.10); YEARS],
            tax_rate: dec!(0.21),
            ar_days: dec!(2),
            loan_amount: 15_000_000,
            interest_rate: dec!(0.065),
            loan_term_months: 84,
            down_payment_pct: dec!(0.20),
            working_capital_months: dec!(3),
            depreciation_years: dec!(10),
            ..Default::default()
        }
    }

    fn run() -> (Vec<MonthlyProjection>, Vec<AnnualSummary>) {
        let a = assumptions();
        let costs = vec![StartupCostLineItem::new(
            "build",
            "Build-out",
            10_000_000,
            CapexClassification::Capex,
            0,
        )];
        let sim = simulate_months(&a, &costs);
        let annual = annualize(&sim.months, &a);
        (sim.months, annual)
    }

    #[test]
    fn test_five_years() {
        let (_, annual) = run();
        assert_eq!(annual.len(), 5);
        assert_eq!(annual[4].year, 5);
    }

    #[test]
    fn test_flows_sum_months() {
        let (months, annual) = run();
        let year2_revenue: Cents = months[12..24].iter().map(|m| m.revenue).sum();
        assert_eq!(annual[1].revenue, year2_revenue);
        let year1_interest: Cents = months[..12].iter().map(|m| m.interest_expense).sum();
        assert_eq!(annual[0].interest_expense, year1_interest);
    }

    #[test]
    fn test_balances_are_december_snapshot() {
        let (months, annual) = run();
        assert_eq!(annual[2].ending_cash, months[35].ending_cash);
        assert_eq!(annual[2].loan_balance, months[35].loan_balance);
        assert_eq!(annual[2].total_equity, months[35].total_equity);
        assert_eq!(annual[2].beginning_cash, months[24].beginning_cash);
    }

    #[test]
    fn test_margins_and_target() {
        let (_, annual) = run();
        let y = &annual[1];
        assert_eq!(y.gross_profit_pct, dec!(0.70));
        assert_eq!(y.target_pretax_income, apply_rate(y.revenue, dec!(0.10)));
        assert_eq!(y.pretax_income_vs_target, y.pretax_income - y.target_pretax_income);
    }

    #[test]
    fn test_zero_revenue_margin_is_zero() {
        let mut a = assumptions();
        a.monthly_auv = 0;
        let sim = simulate_months(&a, &[]);
        let annual = annualize(&sim.months, &a);
        assert_eq!(annual[0].gross_profit_pct, Decimal::ZERO);
        assert_eq!(annual[0].ebitda_pct, Decimal::ZERO);
    }
}
