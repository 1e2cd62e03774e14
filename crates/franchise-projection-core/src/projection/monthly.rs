use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inputs::startup_costs::startup_cost_totals;
use crate::inputs::{CapexClassification, NormalizedAssumptions, StartupCostLineItem};
use crate::projection::depreciation::{build_asset_register, DepreciableAsset};
use crate::projection::loan::{build_loan_schedule, LoanSchedule, LoanTerms};
use crate::types::*;

// ---------------------------------------------------------------------------
// Output structs
// ---------------------------------------------------------------------------

/// Funding and balance sheet at the moment the location opens (month 0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningPosition {
    pub total_startup_investment: Cents,
    pub startup_capex: Cents,
    pub startup_non_capex: Cents,
    pub startup_working_capital: Cents,
    /// Cash spent before opening (CapEx + non-CapEx items)
    pub startup_outlay: Cents,
    pub loan_principal: Cents,
    pub working_capital_reserve: Cents,
    pub equity_contribution: Cents,
    pub opening_cash: Cents,
    /// Pre-opening expense charged against equity
    pub opening_retained_earnings: Cents,
}

/// One month of the projection: P&L, cash flow and balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    pub month: u32,
    pub year: u32,
    pub month_in_year: u32,

    // P&L
    pub revenue: Cents,
    pub cogs: Cents,
    pub royalty: Cents,
    pub ad_fund: Cents,
    pub total_cogs: Cents,
    pub gross_profit: Cents,
    pub direct_labor: Cents,
    pub payroll_tax: Cents,
    pub management_salaries: Cents,
    pub facilities: Cents,
    pub marketing: Cents,
    pub other_opex: Cents,
    pub reinvestment_expense: Cents,
    pub total_opex: Cents,
    pub ebitda: Cents,
    pub depreciation: Cents,
    pub interest_expense: Cents,
    pub pretax_income: Cents,
    pub taxes: Cents,
    pub net_income: Cents,
    /// Memo only: does not touch cash or the P&L
    pub sweat_equity_adjustment: Cents,

    // Cash flow
    pub change_in_receivables: Cents,
    pub change_in_inventory: Cents,
    pub change_in_payables: Cents,
    pub change_in_taxes_payable: Cents,
    pub taxes_paid: Cents,
    pub operating_cash_flow: Cents,
    pub capital_expenditure: Cents,
    pub investing_cash_flow: Cents,
    pub principal_payment: Cents,
    pub distributions: Cents,
    pub financing_cash_flow: Cents,
    pub net_cash_flow: Cents,
    pub cumulative_net_cash_flow: Cents,
    pub beginning_cash: Cents,
    pub ending_cash: Cents,

    // Balance sheet
    pub accounts_receivable: Cents,
    pub inventory: Cents,
    pub gross_fixed_assets: Cents,
    pub accumulated_depreciation: Cents,
    pub net_fixed_assets: Cents,
    pub total_assets: Cents,
    pub accounts_payable: Cents,
    pub taxes_payable: Cents,
    pub loan_balance: Cents,
    pub total_liabilities: Cents,
    pub paid_in_capital: Cents,
    pub retained_earnings: Cents,
    pub total_equity: Cents,
}

/// Everything the monthly walk produces; the annualizer and auditor read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub opening: OpeningPosition,
    pub months: Vec<MonthlyProjection>,
    pub loan: LoanSchedule,
    pub assets: Vec<DepreciableAsset>,
}

// ---------------------------------------------------------------------------
// Opening position
// ---------------------------------------------------------------------------

/// Fund the startup schedule: the loan covers its principal, the owner
/// covers the rest plus the working-capital reserve.
pub fn opening_position(
    a: &NormalizedAssumptions,
    startup_costs: &[StartupCostLineItem],
    loan_principal: Cents,
) -> OpeningPosition {
    let totals = startup_cost_totals(startup_costs);

    let monthly_fixed_costs =
        Decimal::from(a.management_salaries_annual[0] + a.facilities_annual[0])
            / Decimal::from(MONTHS_PER_YEAR);
    let working_capital_reserve = to_cents(monthly_fixed_costs * a.working_capital_months);

    let equity_contribution =
        (totals.total - loan_principal).max(0) + working_capital_reserve;

    OpeningPosition {
        total_startup_investment: totals.total,
        startup_capex: totals.capex,
        startup_non_capex: totals.non_capex,
        startup_working_capital: totals.working_capital,
        startup_outlay: totals.outlay(),
        loan_principal,
        working_capital_reserve,
        equity_contribution,
        opening_cash: equity_contribution + loan_principal - totals.outlay(),
        opening_retained_earnings: -totals.non_capex,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Walk the 60 projection months in order, carrying cash, loan, working
/// capital, tax and equity balances forward.
///
/// Never fails on economically infeasible inputs: negative margins,
/// negative cash and losses flow through as values.
pub fn simulate_months(
    a: &NormalizedAssumptions,
    startup_costs: &[StartupCostLineItem],
) -> Simulation {
    let terms = LoanTerms::from_assumptions(a);
    let loan = build_loan_schedule(&terms, MONTHS);
    let opening = opening_position(a, startup_costs, terms.principal);
    let assets = build_asset_register(a, &startup_cost_totals(startup_costs));

    let ramp_span = Decimal::from(MONTHS_PER_YEAR - 1);
    let delay = a.tax_payment_delay_months as usize;

    // Carry-forward state
    let mut cash = opening.opening_cash;
    let mut cumulative_net_cash_flow = -opening.equity_contribution;
    let mut receivables = 0;
    let mut inventory = 0;
    let mut payables = 0;
    let mut taxes_payable = 0;
    let mut gross_fixed_assets = opening.startup_capex;
    let mut accumulated_depreciation = 0;
    let mut retained_earnings = opening.opening_retained_earnings;
    let mut year_revenue = 0;
    let mut trailing_revenue = 0;
    let mut ytd_pretax = 0;
    let mut ytd_taxes = 0;
    let mut accrued_by_month: Vec<Cents> = Vec::with_capacity(MONTHS as usize);

    let mut months = Vec::with_capacity(MONTHS as usize);

    for month in 1..=MONTHS {
        let year = year_of_month(month);
        let y = year - 1;
        let miy = month_in_year(month);

        if miy == 1 {
            ytd_pretax = 0;
            ytd_taxes = 0;
            if year > 1 {
                year_revenue = apply_rate(trailing_revenue, Decimal::ONE + a.growth_rates[y]);
            }
        }

        // ---------------------------------------------------------------
        // Revenue and cost of sales
        // ---------------------------------------------------------------
        let revenue = if year == 1 {
            let start = a.starting_month_auv_pct;
            let ramp = start + (Decimal::ONE - start) * Decimal::from(miy - 1) / ramp_span;
            to_cents(Decimal::from(a.monthly_auv) * ramp)
        } else {
            year_revenue
        };
        if miy == MONTHS_PER_YEAR {
            trailing_revenue = revenue;
        }

        let cogs = apply_rate(revenue, a.cogs_pct[y]);
        let royalty = apply_rate(revenue, a.royalty_pct[y]);
        let ad_fund = apply_rate(revenue, a.ad_fund_pct[y]);
        let total_cogs = cogs + royalty + ad_fund;
        let gross_profit = revenue - total_cogs;

        // ---------------------------------------------------------------
        // Operating expenses
        // ---------------------------------------------------------------
        let direct_labor = apply_rate(revenue, a.labor_pct[y]);
        let payroll_tax = apply_rate(direct_labor, a.payroll_tax_pct[y]);
        let management_salaries =
            pro_rata_slice(a.management_salaries_annual[y], MONTHS_PER_YEAR, miy);
        let facilities = pro_rata_slice(a.facilities_annual[y], MONTHS_PER_YEAR, miy);
        let marketing = apply_rate(revenue, a.marketing_pct[y]);
        let other_opex = apply_rate(revenue, a.other_opex_pct[y]);

        let (reinvestment_expense, capital_expenditure) = match a.reinvestment_classification {
            CapexClassification::Capex => {
                let capex = if miy == 1 { a.non_capex_investment[y] } else { 0 };
                (0, capex)
            }
            CapexClassification::NonCapex | CapexClassification::WorkingCapital => (
                pro_rata_slice(a.non_capex_investment[y], MONTHS_PER_YEAR, miy),
                0,
            ),
        };

        let total_opex = direct_labor
            + payroll_tax
            + management_salaries
            + facilities
            + marketing
            + other_opex
            + reinvestment_expense;
        let ebitda = gross_profit - total_opex;

        // ---------------------------------------------------------------
        // Depreciation, interest, taxes
        // ---------------------------------------------------------------
        let depreciation: Cents = assets.iter().map(|asset| asset.depreciation_for_month(month)).sum();
        let loan_period = loan.period(month);
        let interest_expense = loan_period.map_or(0, |p| p.interest);
        let principal_payment = loan_period.map_or(0, |p| p.principal);
        let loan_balance = loan_period.map_or(terms.principal, |p| p.closing_balance);

        let pretax_income = ebitda - depreciation - interest_expense;

        // Taxes accrue on year-to-date income so a year's total is
        // max(0, annual pre-tax) × rate regardless of intra-year losses.
        ytd_pretax += pretax_income;
        let ytd_taxes_due = apply_rate(ytd_pretax.max(0), a.tax_rate);
        let taxes = ytd_taxes_due - ytd_taxes;
        ytd_taxes = ytd_taxes_due;
        accrued_by_month.push(taxes);

        let net_income = pretax_income - taxes;

        let taxes_paid = if delay == 0 {
            taxes
        } else {
            let idx = month as usize - 1;
            if idx >= delay {
                accrued_by_month[idx - delay]
            } else {
                0
            }
        };

        // ---------------------------------------------------------------
        // Working capital
        // ---------------------------------------------------------------
        let new_receivables = to_cents(Decimal::from(revenue) * a.ar_days / DAYS_PER_MONTH);
        let new_inventory = to_cents(Decimal::from(cogs) * a.inventory_days / DAYS_PER_MONTH);
        let new_payables = to_cents(Decimal::from(cogs) * a.ap_days / DAYS_PER_MONTH);
        let change_in_receivables = new_receivables - receivables;
        let change_in_inventory = new_inventory - inventory;
        let change_in_payables = new_payables - payables;
        let change_in_taxes_payable = taxes - taxes_paid;

        // ---------------------------------------------------------------
        // Cash flow
        // ---------------------------------------------------------------
        let operating_cash_flow = net_income + depreciation - change_in_receivables
            - change_in_inventory
            + change_in_payables
            + change_in_taxes_payable;
        let investing_cash_flow = -capital_expenditure;
        let distributions = pro_rata_slice(a.distributions[y], MONTHS_PER_YEAR, miy);
        let financing_cash_flow = -principal_payment - distributions;
        let net_cash_flow = operating_cash_flow + investing_cash_flow + financing_cash_flow;

        let beginning_cash = cash;
        let ending_cash = beginning_cash + net_cash_flow;
        cumulative_net_cash_flow += net_cash_flow;

        // ---------------------------------------------------------------
        // Balance sheet
        // ---------------------------------------------------------------
        gross_fixed_assets += capital_expenditure;
        accumulated_depreciation += depreciation;
        retained_earnings += net_income - distributions;
        taxes_payable += change_in_taxes_payable;

        let net_fixed_assets = gross_fixed_assets - accumulated_depreciation;
        let total_assets = ending_cash + new_receivables + new_inventory + net_fixed_assets;
        let total_liabilities = new_payables + taxes_payable + loan_balance;
        let total_equity = opening.equity_contribution + retained_earnings;

        months.push(MonthlyProjection {
            month,
            year: year as u32,
            month_in_year: miy,
            revenue,
            cogs,
            royalty,
            ad_fund,
            total_cogs,
            gross_profit,
            direct_labor,
            payroll_tax,
            management_salaries,
            facilities,
            marketing,
            other_opex,
            reinvestment_expense,
            total_opex,
            ebitda,
            depreciation,
            interest_expense,
            pretax_income,
            taxes,
            net_income,
            sweat_equity_adjustment: pro_rata_slice(
                a.shareholder_salary_adj[y],
                MONTHS_PER_YEAR,
                miy,
            ),
            change_in_receivables,
            change_in_inventory,
            change_in_payables,
            change_in_taxes_payable,
            taxes_paid,
            operating_cash_flow,
            capital_expenditure,
            investing_cash_flow,
            principal_payment,
            distributions,
            financing_cash_flow,
            net_cash_flow,
            cumulative_net_cash_flow,
            beginning_cash,
            ending_cash,
            accounts_receivable: new_receivables,
            inventory: new_inventory,
            gross_fixed_assets,
            accumulated_depreciation,
            net_fixed_assets,
            total_assets,
            accounts_payable: new_payables,
            taxes_payable,
            loan_balance,
            total_liabilities,
            paid_in_capital: opening.equity_contribution,
            retained_earnings,
            total_equity,
        });

        // Advance carry-forward state
        cash = ending_cash;
        receivables = new_receivables;
        inventory = new_inventory;
        payables = new_payables;
    }

    debug!(
        opening_cash = opening.opening_cash,
        ending_cash = cash,
        assets = assets.len(),
        "simulated {} months",
        months.len()
    );

    Simulation {
        opening,
        months,
        loan,
        assets,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_assumptions() -> NormalizedAssumptions {
        NormalizedAssumptions {
            monthly_auv: 6_000_000,
            growth_rates: [dec!(0), dec!(0.05), dec!(0.04), dec!(0.03), dec!(0.03)],
            starting_month_auv_pct: dec!(0.5),
            cogs_pct: [dec!(0.30); YEARS],
            labor_pct: [dec!(0.25); YEARS],
            marketing_pct: [dec!(0.02); YEARS],
            royalty_pct: [dec!(0.06); YEARS],
            ad_fund_pct: [dec!(0.02); YEARS],
            payroll_tax_pct: [dec!(0.10); YEARS],
            other_opex_pct: [dec!(0.03); YEARS],
            facilities_annual: [4_800_000; YEARS],
            management_salaries_annual: [6_000_000; YEARS],
            tax_rate: dec!(0.21),
            ar_days: dec!(5),
            ap_days: dec!(15),
            inventory_days: dec!(10),
            tax_payment_delay_months: 3,
            ebitda_multiple: dec!(3),
            loan_amount: 15_000_000,
            interest_rate: dec!(0.065),
            loan_term_months: 84,
            down_payment_pct: dec!(0.20),
            working_capital_months: dec!(3),
            depreciation_years: dec!(10),
            ..Default::default()
        }
    }

    fn sample_costs() -> Vec<StartupCostLineItem> {
        vec![
            StartupCostLineItem::new("equip", "Equipment", 15_000_000, CapexClassification::Capex, 0),
            StartupCostLineItem::new("fee", "Franchise fee", 3_500_000, CapexClassification::NonCapex, 1),
            StartupCostLineItem::new("wc", "Opening cash", 1_500_000, CapexClassification::WorkingCapital, 2),
        ]
    }

    #[test]
    fn test_sixty_months_in_order() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        assert_eq!(sim.months.len(), 60);
        for (idx, m) in sim.months.iter().enumerate() {
            assert_eq!(m.month, idx as u32 + 1);
        }
        assert_eq!(sim.months[59].year, 5);
    }

    #[test]
    fn test_opening_position() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        let o = sim.opening;
        assert_eq!(o.total_startup_investment, 20_000_000);
        assert_eq!(o.loan_principal, 12_000_000);
        // (6,000,000 + 4,800,000) / 12 × 3
        assert_eq!(o.working_capital_reserve, 2_700_000);
        assert_eq!(o.equity_contribution, 8_000_000 + 2_700_000);
        assert_eq!(o.opening_cash, 10_700_000 + 12_000_000 - 18_500_000);
        assert_eq!(sim.months[0].beginning_cash, o.opening_cash);
    }

    #[test]
    fn test_year1_ramp() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        assert_eq!(sim.months[0].revenue, 3_000_000);
        assert_eq!(sim.months[11].revenue, 6_000_000);
        assert!(sim.months[5].revenue > sim.months[4].revenue);
    }

    #[test]
    fn test_growth_applies_to_trailing_revenue() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        // year 2: 6,000,000 × 1.05, flat across the year
        assert!(sim.months[12..24].iter().all(|m| m.revenue == 6_300_000));
        // year 3: 6,300,000 × 1.04
        assert_eq!(sim.months[24].revenue, 6_552_000);
    }

    #[test]
    fn test_cost_lines() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        let m = &sim.months[11];
        assert_eq!(m.cogs, 1_800_000);
        assert_eq!(m.royalty, 360_000);
        assert_eq!(m.ad_fund, 120_000);
        assert_eq!(m.total_cogs, 2_280_000);
        assert_eq!(m.direct_labor, 1_500_000);
        assert_eq!(m.payroll_tax, 150_000);
        assert_eq!(m.management_salaries, 500_000);
        assert_eq!(m.facilities, 400_000);
        assert_eq!(m.ebitda, m.gross_profit - m.total_opex);
    }

    #[test]
    fn test_cash_continuity() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        for pair in sim.months.windows(2) {
            assert_eq!(pair[1].beginning_cash, pair[0].ending_cash);
        }
    }

    #[test]
    fn test_balance_sheet_balances_every_month() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        for m in &sim.months {
            assert_eq!(
                m.total_assets,
                m.total_liabilities + m.total_equity,
                "Month {} does not balance",
                m.month
            );
        }
    }

    #[test]
    fn test_annual_taxes_follow_annual_income() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        for year in sim.months.chunks(12) {
            let pretax: Cents = year.iter().map(|m| m.pretax_income).sum();
            let taxes: Cents = year.iter().map(|m| m.taxes).sum();
            assert_eq!(taxes, apply_rate(pretax.max(0), dec!(0.21)));
        }
    }

    #[test]
    fn test_tax_payment_delay() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        assert_eq!(sim.months[0].taxes_paid, 0);
        assert_eq!(sim.months[2].taxes_paid, 0);
        assert_eq!(sim.months[3].taxes_paid, sim.months[0].taxes);
        assert_eq!(sim.months[40].taxes_paid, sim.months[37].taxes);
    }

    #[test]
    fn test_working_capital_balances() {
        let sim = simulate_months(&sample_assumptions(), &sample_costs());
        let m = &sim.months[11];
        // 6,000,000 × 5/30
        assert_eq!(m.accounts_receivable, 1_000_000);
        // 1,800,000 × 15/30
        assert_eq!(m.accounts_payable, 900_000);
        assert_eq!(m.inventory, 600_000);
    }

    #[test]
    fn test_negative_margins_propagate() {
        let mut a = sample_assumptions();
        a.monthly_auv = 100_000;
        let sim = simulate_months(&a, &sample_costs());
        assert!(sim.months.iter().all(|m| m.ebitda < 0));
        assert!(sim.months.iter().all(|m| m.taxes == 0));
        assert!(sim.months[59].ending_cash < 0);
    }

    #[test]
    fn test_capitalized_reinvestment() {
        let mut a = sample_assumptions();
        a.non_capex_investment = [0, 1_200_000, 0, 0, 0];
        let sim = simulate_months(&a, &sample_costs());
        assert_eq!(sim.months[12].capital_expenditure, 1_200_000);
        assert_eq!(sim.months[12].investing_cash_flow, -1_200_000);
        assert_eq!(sim.months[13].capital_expenditure, 0);
        assert_eq!(sim.months[59].gross_fixed_assets, 16_200_000);
    }

    #[test]
    fn test_expensed_reinvestment() {
        let mut a = sample_assumptions();
        a.non_capex_investment = [0, 1_200_000, 0, 0, 0];
        a.reinvestment_classification = CapexClassification::NonCapex;
        let sim = simulate_months(&a, &sample_costs());
        assert!(sim.months[12..24].iter().all(|m| m.reinvestment_expense == 100_000));
        assert_eq!(sim.months[12].capital_expenditure, 0);
    }

    #[test]
    fn test_sweat_equity_is_memo_only() {
        let mut a = sample_assumptions();
        let base = simulate_months(&a, &sample_costs());
        a.shareholder_salary_adj = [3_600_000; YEARS];
        let with_sweat = simulate_months(&a, &sample_costs());
        assert_eq!(with_sweat.months[0].sweat_equity_adjustment, 300_000);
        assert_eq!(base.months[59].ending_cash, with_sweat.months[59].ending_cash);
        assert_eq!(base.months[59].net_income, with_sweat.months[59].net_income);
    }
}
