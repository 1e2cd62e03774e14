use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inputs::field_value::{FieldValue, PerYearField};
use crate::inputs::startup_costs::{CapexClassification, StartupCostLineItem};
use crate::types::{Cents, Days, Multiple, Rate};

/// A plan snapshot as persisted by the plan store: sparse, brand-seeded
/// assumptions plus the startup-cost schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub financial_inputs: FinancialAssumptions,
    #[serde(default)]
    pub startup_costs: Vec<StartupCostLineItem>,
}

/// Every economic assumption of a plan, grouped as the plan editor shows
/// them. Any field may be absent; the normalizer fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialAssumptions {
    pub revenue: RevenueAssumptions,
    pub operating_costs: OperatingCostAssumptions,
    pub profitability: ProfitabilityAssumptions,
    pub working_capital: WorkingCapitalAssumptions,
    pub financing: FinancingAssumptions,
    pub startup_capital: StartupCapitalAssumptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueAssumptions {
    /// Full-run-rate monthly average unit volume
    pub monthly_auv: FieldValue<Cents>,
    /// Annual growth per year; year 1 is the ramp year
    pub growth_rates: PerYearField<Rate>,
    /// Month-1 revenue as a fraction of AUV
    pub starting_month_auv_pct: FieldValue<Rate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingCostAssumptions {
    pub cogs_pct: PerYearField<Rate>,
    pub labor_pct: PerYearField<Rate>,
    pub marketing_pct: PerYearField<Rate>,
    pub royalty_pct: PerYearField<Rate>,
    pub ad_fund_pct: PerYearField<Rate>,
    pub payroll_tax_pct: PerYearField<Rate>,
    pub other_opex_pct: PerYearField<Rate>,
    pub facilities_annual: PerYearField<Cents>,
    /// When present, replaces `facilities_annual` with the sum of its lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facilities_breakdown: Option<FacilitiesBreakdown>,
    pub management_salaries_annual: PerYearField<Cents>,
}

/// Annual facilities cost decomposed into its lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitiesBreakdown {
    pub rent: PerYearField<Cents>,
    pub utilities: PerYearField<Cents>,
    pub telecom: PerYearField<Cents>,
    pub vehicle: PerYearField<Cents>,
    pub insurance: PerYearField<Cents>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitabilityAssumptions {
    pub target_pretax_profit_pct: PerYearField<Rate>,
    /// Owner compensation add-back (sweat equity), annual
    pub shareholder_salary_adj: PerYearField<Cents>,
    pub distributions: PerYearField<Cents>,
    pub non_capex_investment: PerYearField<Cents>,
    pub reinvestment_classification: CapexClassification,
    pub tax_rate: FieldValue<Rate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingCapitalAssumptions {
    pub ar_days: FieldValue<Days>,
    pub ap_days: FieldValue<Days>,
    pub inventory_days: FieldValue<Days>,
    pub tax_payment_delay_months: FieldValue<Decimal>,
    pub ebitda_multiple: FieldValue<Multiple>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancingAssumptions {
    pub loan_amount: FieldValue<Cents>,
    pub interest_rate: FieldValue<Rate>,
    pub loan_term_months: FieldValue<Decimal>,
    pub down_payment_pct: FieldValue<Rate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupCapitalAssumptions {
    pub working_capital_months: FieldValue<Decimal>,
    pub depreciation_years: FieldValue<Decimal>,
}
