use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::inputs::{CapexClassification, NormalizedAssumptions, StartupCostLineItem};
use crate::projection::annual::AnnualSummary;
use crate::projection::depreciation::life_months;
use crate::projection::loan::LoanTerms;
use crate::projection::metrics::{
    RoiMetrics, ValuationOutput, CAPITAL_GAINS_TAX_RATE, TRANSACTION_COST_PCT,
};
use crate::projection::monthly::Simulation;
use crate::types::*;

/// One cent, for identities that hold exactly up to a single rounding.
const CENT: Decimal = dec!(1);

const RATIO_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    BalanceSheetMonthly,
    BalanceSheetAnnual,
    DepreciationCapex,
    LoanAmortization,
    PnlToCashFlow,
    CashContinuity,
    NetCashIdentity,
    EndingCashIdentity,
    PnlIntegrity,
    EquityContinuity,
    CorporateTax,
    WorkingCapitalAr,
    BreakEven,
    RoiDerivation,
    ValuationDerivation,
}

/// An audited formula: `expected` is recomputed from raw inputs, `actual`
/// is what the projection produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityCheckResult {
    pub category: CheckCategory,
    pub name: String,
    pub expected: Decimal,
    pub actual: Decimal,
    pub tolerance: Decimal,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: CheckCategory,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub all_checks_passed: bool,
    pub categories: Vec<CategorySummary>,
}

/// Everything the auditor reads. Nothing here is modified.
#[derive(Debug, Clone, Copy)]
pub struct AuditSubject<'a> {
    pub assumptions: &'a NormalizedAssumptions,
    pub startup_costs: &'a [StartupCostLineItem],
    pub simulation: &'a Simulation,
    pub annual: &'a [AnnualSummary],
    pub roi: &'a RoiMetrics,
    pub valuation: &'a ValuationOutput,
}

// ---------------------------------------------------------------------------
// Check builder
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Checks {
    results: Vec<IdentityCheckResult>,
}

impl Checks {
    /// `|expected − actual| ≤ tolerance`
    fn within(
        &mut self,
        category: CheckCategory,
        name: String,
        expected: Decimal,
        actual: Decimal,
        tolerance: Decimal,
    ) {
        self.results.push(IdentityCheckResult {
            category,
            name,
            expected,
            actual,
            tolerance,
            passed: (expected - actual).abs() <= tolerance,
        });
    }

    fn cents(&mut self, category: CheckCategory, name: String, expected: Cents, actual: Cents) {
        self.within(category, name, Decimal::from(expected), Decimal::from(actual), CENT);
    }

    /// Sign check; `expected` carries the threshold.
    fn sign(&mut self, category: CheckCategory, name: String, actual: Cents, passed: bool) {
        self.results.push(IdentityCheckResult {
            category,
            name,
            expected: Decimal::ZERO,
            actual: Decimal::from(actual),
            tolerance: Decimal::ZERO,
            passed,
        });
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Recompute every audited formula independently and compare it with the
/// projection. Failures are reported, never raised.
pub fn run_identity_checks(subject: &AuditSubject<'_>) -> Vec<IdentityCheckResult> {
    let mut checks = Checks::default();

    check_balance_sheet(&mut checks, subject);
    check_depreciation(&mut checks, subject);
    check_loan(&mut checks, subject);
    check_cash_flow(&mut checks, subject);
    check_pnl(&mut checks, subject);
    check_equity(&mut checks, subject);
    check_taxes(&mut checks, subject);
    check_receivables(&mut checks, subject);
    check_break_even(&mut checks, subject);
    check_roi(&mut checks, subject);
    check_valuation(&mut checks, subject);

    checks.results
}

/// Pass/fail counts per category, in category order.
pub fn summarize_checks(results: &[IdentityCheckResult]) -> IdentitySummary {
    let mut by_category: BTreeMap<CheckCategory, (usize, usize)> = BTreeMap::new();
    for r in results {
        let entry = by_category.entry(r.category).or_default();
        entry.0 += 1;
        if r.passed {
            entry.1 += 1;
        }
    }

    let categories: Vec<CategorySummary> = by_category
        .into_iter()
        .map(|(category, (total, passed))| CategorySummary {
            category,
            total,
            passed,
            failed: total - passed,
        })
        .collect();

    let passed = results.iter().filter(|r| r.passed).count();
    IdentitySummary {
        total_checks: results.len(),
        passed,
        failed: results.len() - passed,
        all_checks_passed: passed == results.len(),
        categories,
    }
}

// ---------------------------------------------------------------------------
// Balance sheet
// ---------------------------------------------------------------------------

fn check_balance_sheet(checks: &mut Checks, s: &AuditSubject<'_>) {
    for m in &s.simulation.months {
        let assets = m.ending_cash + m.accounts_receivable + m.inventory + m.net_fixed_assets;
        let liabilities = m.accounts_payable + m.taxes_payable + m.loan_balance;
        let equity = m.paid_in_capital + m.retained_earnings;
        checks.cents(
            CheckCategory::BalanceSheetMonthly,
            format!("Month {}: assets = liabilities + equity", m.month),
            liabilities + equity,
            assets,
        );
    }

    for y in s.annual {
        checks.cents(
            CheckCategory::BalanceSheetAnnual,
            format!("Year {}: assets = liabilities + equity", y.year),
            y.total_liabilities + y.total_equity,
            y.total_assets,
        );
    }
}

// ---------------------------------------------------------------------------
// Depreciation
// ---------------------------------------------------------------------------

fn check_depreciation(checks: &mut Checks, s: &AuditSubject<'_>) {
    let a = s.assumptions;
    let life = Decimal::from(life_months(a.depreciation_years));

    // Capitalized costs rebuilt from the raw schedule.
    let mut costs: Vec<(Cents, u32)> = Vec::new();
    let startup_capex: Cents = s
        .startup_costs
        .iter()
        .filter(|c| c.capex_classification == CapexClassification::Capex)
        .map(|c| c.amount)
        .sum();
    if startup_capex != 0 {
        costs.push((startup_capex, 1));
    }
    if a.reinvestment_classification == CapexClassification::Capex {
        for (idx, amount) in a.non_capex_investment.iter().enumerate() {
            if *amount != 0 {
                costs.push((*amount, idx as u32 * MONTHS_PER_YEAR + 1));
            }
        }
    }
    let tolerance = CENT * Decimal::from(costs.len().max(1) as u64);

    for y in s.annual {
        let month_end = y.year * MONTHS_PER_YEAR;
        let expected: Decimal = costs
            .iter()
            .map(|(cost, in_service)| {
                let elapsed = Decimal::from((month_end + 1).saturating_sub(*in_service)).min(life);
                Decimal::from(*cost) * elapsed / life
            })
            .sum();
        let actual = s
            .simulation
            .months
            .get(month_end as usize - 1)
            .map_or(0, |m| m.accumulated_depreciation);
        checks.within(
            CheckCategory::DepreciationCapex,
            format!("Year {}: accumulated straight-line depreciation", y.year),
            expected,
            Decimal::from(actual),
            tolerance,
        );
    }

    for asset in &s.simulation.assets {
        checks.cents(
            CheckCategory::DepreciationCapex,
            format!("{}: depreciation over useful life = cost", asset.label),
            asset.cost,
            asset.full_life_total(),
        );
    }

    if let Some(last) = s.simulation.months.last() {
        let capitalized: Cents = costs.iter().map(|(cost, _)| cost).sum();
        checks.cents(
            CheckCategory::DepreciationCapex,
            "Gross fixed assets = capitalized costs".into(),
            capitalized,
            last.gross_fixed_assets,
        );
    }
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

fn check_loan(checks: &mut Checks, s: &AuditSubject<'_>) {
    let terms = LoanTerms::from_assumptions(s.assumptions);
    let payment = terms.level_payment();

    for y in s.annual {
        let elapsed = y.year * MONTHS_PER_YEAR;
        let tolerance = terms.rounding_drift_bound(elapsed).max(CENT);
        checks.within(
            CheckCategory::LoanAmortization,
            format!("Year {}: loan balance vs closed-form annuity", y.year),
            terms.closed_form_balance(payment, elapsed),
            Decimal::from(y.loan_balance),
            tolerance,
        );
    }

    let principal_paid: Cents = s.simulation.months.iter().map(|m| m.principal_payment).sum();
    let closing = s.simulation.months.last().map_or(terms.principal, |m| m.loan_balance);
    checks.cents(
        CheckCategory::LoanAmortization,
        "Principal repaid = loan principal − closing balance".into(),
        terms.principal - closing,
        principal_paid,
    );
}

// ---------------------------------------------------------------------------
// Cash flow
// ---------------------------------------------------------------------------

fn check_cash_flow(checks: &mut Checks, s: &AuditSubject<'_>) {
    let opening = &s.simulation.opening;
    let mut prior_ar = 0;
    let mut prior_inventory = 0;
    let mut prior_ap = 0;
    let mut prior_taxes_payable = 0;
    let mut prior_cash = opening.opening_cash;

    for m in &s.simulation.months {
        let expected_operating = m.net_income + m.depreciation
            - (m.accounts_receivable - prior_ar)
            - (m.inventory - prior_inventory)
            + (m.accounts_payable - prior_ap)
            + (m.taxes_payable - prior_taxes_payable);
        checks.cents(
            CheckCategory::PnlToCashFlow,
            format!("Month {}: operating cash flow from net income", m.month),
            expected_operating,
            m.operating_cash_flow,
        );

        checks.cents(
            CheckCategory::CashContinuity,
            format!("Month {}: beginning cash = prior ending cash", m.month),
            prior_cash,
            m.beginning_cash,
        );

        checks.cents(
            CheckCategory::NetCashIdentity,
            format!("Month {}: net = operating + investing + financing", m.month),
            m.operating_cash_flow + m.investing_cash_flow + m.financing_cash_flow,
            m.net_cash_flow,
        );

        checks.cents(
            CheckCategory::EndingCashIdentity,
            format!("Month {}: ending = beginning + net", m.month),
            m.beginning_cash + m.net_cash_flow,
            m.ending_cash,
        );

        prior_ar = m.accounts_receivable;
        prior_inventory = m.inventory;
        prior_ap = m.accounts_payable;
        prior_taxes_payable = m.taxes_payable;
        prior_cash = m.ending_cash;
    }

    for y in s.annual {
        checks.cents(
            CheckCategory::EndingCashIdentity,
            format!("Year {}: ending = beginning + net", y.year),
            y.beginning_cash + y.net_cash_flow,
            y.ending_cash,
        );
    }
}

// ---------------------------------------------------------------------------
// P&L
// ---------------------------------------------------------------------------

fn check_pnl(checks: &mut Checks, s: &AuditSubject<'_>) {
    for m in &s.simulation.months {
        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Month {}: pre-tax = EBITDA − depreciation − interest", m.month),
            m.gross_profit - m.total_opex - m.depreciation - m.interest_expense,
            m.pretax_income,
        );
    }

    let year_months = s.simulation.months.chunks(MONTHS_PER_YEAR as usize);
    for (y, months) in s.annual.iter().zip(year_months) {
        let monthly_revenue: Cents = months.iter().map(|m| m.revenue).sum();
        let monthly_net_income: Cents = months.iter().map(|m| m.net_income).sum();

        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Year {}: gross profit = revenue − total COGS", y.year),
            y.revenue - y.total_cogs,
            y.gross_profit,
        );
        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Year {}: pre-tax = gross profit − opex − depreciation − interest", y.year),
            y.gross_profit - y.total_opex - y.depreciation - y.interest_expense,
            y.pretax_income,
        );
        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Year {}: net income = pre-tax − taxes", y.year),
            y.pretax_income - y.taxes,
            y.net_income,
        );
        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Year {}: revenue = Σ monthly revenue", y.year),
            monthly_revenue,
            y.revenue,
        );
        checks.cents(
            CheckCategory::PnlIntegrity,
            format!("Year {}: net income = Σ monthly net income", y.year),
            monthly_net_income,
            y.net_income,
        );
    }
}

// ---------------------------------------------------------------------------
// Equity, taxes, receivables
// ---------------------------------------------------------------------------

fn check_equity(checks: &mut Checks, s: &AuditSubject<'_>) {
    let opening = &s.simulation.opening;
    let mut prior_equity = opening.equity_contribution + opening.opening_retained_earnings;

    for m in &s.simulation.months {
        checks.cents(
            CheckCategory::EquityContinuity,
            format!("Month {}: prior equity + net income − distributions", m.month),
            prior_equity + m.net_income - m.distributions,
            m.total_equity,
        );
        prior_equity = m.total_equity;
    }
}

fn check_taxes(checks: &mut Checks, s: &AuditSubject<'_>) {
    let rate = s.assumptions.tax_rate;
    for y in s.annual {
        checks.cents(
            CheckCategory::CorporateTax,
            format!("Year {}: taxes = max(0, pre-tax) × rate", y.year),
            apply_rate(y.pretax_income.max(0), rate),
            y.taxes,
        );
    }
}

fn check_receivables(checks: &mut Checks, s: &AuditSubject<'_>) {
    let ar_days = s.assumptions.ar_days;
    for m in &s.simulation.months {
        checks.cents(
            CheckCategory::WorkingCapitalAr,
            format!("Month {}: AR = revenue × AR days / 30", m.month),
            to_cents(Decimal::from(m.revenue) * ar_days / DAYS_PER_MONTH),
            m.accounts_receivable,
        );
    }
}

// ---------------------------------------------------------------------------
// Break-even, ROI, valuation
// ---------------------------------------------------------------------------

fn check_break_even(checks: &mut Checks, s: &AuditSubject<'_>) {
    let months = &s.simulation.months;

    match s.roi.break_even_month {
        Some(k) => {
            let idx = k as usize - 1;
            let at = months.get(idx).map_or(0, |m| m.cumulative_net_cash_flow);
            checks.sign(
                CheckCategory::BreakEven,
                format!("Month {k}: cumulative cash flow ≥ 0"),
                at,
                at >= 0,
            );
            if k > 1 {
                let before = months
                    .iter()
                    .take(idx)
                    .map(|m| m.cumulative_net_cash_flow)
                    .max()
                    .unwrap_or(0);
                checks.sign(
                    CheckCategory::BreakEven,
                    format!("Months before {k}: cumulative cash flow < 0"),
                    before,
                    before < 0,
                );
            }
        }
        None => {
            let peak = months
                .iter()
                .map(|m| m.cumulative_net_cash_flow)
                .max()
                .unwrap_or(0);
            checks.sign(
                CheckCategory::BreakEven,
                "No break-even: cumulative cash flow stays < 0".into(),
                peak,
                peak < 0,
            );
        }
    }
}

fn check_roi(checks: &mut Checks, s: &AuditSubject<'_>) {
    let total_startup: Cents = s.startup_costs.iter().map(|c| c.amount).sum();
    checks.cents(
        CheckCategory::RoiDerivation,
        "Total startup investment = Σ line items".into(),
        total_startup,
        s.roi.total_startup_investment,
    );

    let net_flows: Cents = s.simulation.months.iter().map(|m| m.net_cash_flow).sum();
    let cumulative = net_flows - s.simulation.opening.equity_contribution;
    checks.cents(
        CheckCategory::RoiDerivation,
        "Five-year cumulative cash flow = Σ net cash flow − equity".into(),
        cumulative,
        s.roi.five_year_cumulative_cash_flow,
    );

    checks.within(
        CheckCategory::RoiDerivation,
        "Five-year ROI = cumulative cash flow / startup investment".into(),
        cents_ratio(cumulative, total_startup),
        s.roi.five_year_roi_pct,
        RATIO_TOLERANCE,
    );
}

fn check_valuation(checks: &mut Checks, s: &AuditSubject<'_>) {
    let multiple = s.assumptions.ebitda_multiple;

    for (y, v) in s.annual.iter().zip(&s.valuation.by_year) {
        let value = to_cents(Decimal::from(y.ebitda + y.sweat_equity_adjustment) * multiple).max(0);
        checks.cents(
            CheckCategory::ValuationDerivation,
            format!("Year {}: value = adjusted NOI × multiple", y.year),
            value,
            v.estimated_value,
        );

        let costs = apply_rate(value, TRANSACTION_COST_PCT);
        let gain_tax = apply_rate(
            (value - costs - y.net_fixed_assets).max(0),
            CAPITAL_GAINS_TAX_RATE,
        );
        checks.cents(
            CheckCategory::ValuationDerivation,
            format!("Year {}: net after-tax proceeds", y.year),
            value - costs - gain_tax - y.loan_balance,
            v.net_after_tax_proceeds,
        );
    }

    if let Some(last) = s.valuation.by_year.last() {
        checks.cents(
            CheckCategory::ValuationDerivation,
            "Headline value = year-5 value".into(),
            last.estimated_value,
            s.valuation.estimated_value,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(category: CheckCategory, passed: bool) -> IdentityCheckResult {
        IdentityCheckResult {
            category,
            name: "check".into(),
            expected: Decimal::ZERO,
            actual: Decimal::ZERO,
            tolerance: CENT,
            passed,
        }
    }

    #[test]
    fn test_summary_counts_by_category() {
        let results = vec![
            result(CheckCategory::CorporateTax, true),
            result(CheckCategory::BalanceSheetMonthly, true),
            result(CheckCategory::CorporateTax, false),
        ];
        let summary = summarize_checks(&results);
        assert_eq!(summary.total_checks, 3);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_checks_passed);
        assert_eq!(summary.categories[0].category, CheckCategory::BalanceSheetMonthly);
        assert_eq!(summary.categories[1].total, 2);
        assert_eq!(summary.categories[1].failed, 1);
    }

    #[test]
    fn test_empty_summary_passes() {
        let summary = summarize_checks(&[]);
        assert!(summary.all_checks_passed);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_within_tolerance() {
        let mut checks = Checks::default();
        checks.cents(CheckCategory::CashContinuity, "a".into(), 100, 101);
        checks.cents(CheckCategory::CashContinuity, "b".into(), 100, 102);
        assert!(checks.results[0].passed);
        assert!(!checks.results[1].passed);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&CheckCategory::WorkingCapitalAr).unwrap();
        assert_eq!(json, "\"working_capital_ar\"");
    }
}
