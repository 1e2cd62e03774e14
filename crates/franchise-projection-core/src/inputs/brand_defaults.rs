use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inputs::assumptions::{
    FinancialAssumptions, FinancingAssumptions, OperatingCostAssumptions, PlanInput,
    ProfitabilityAssumptions, RevenueAssumptions, StartupCapitalAssumptions,
    WorkingCapitalAssumptions,
};
use crate::inputs::field_value::{FieldSource, FieldValue, PerYearField};
use crate::inputs::normalize::NormalizedAssumptions;
use crate::inputs::startup_costs::{normalize_sort_order, StartupCostLineItem};

/// Brand-level baseline shared by every plan of a brand. Passed explicitly
/// to the normalizer and to plan seeding; never held globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDefaults {
    pub brand_name: String,
    pub assumptions: NormalizedAssumptions,
    #[serde(default)]
    pub startup_costs: Vec<StartupCostLineItem>,
}

impl BrandDefaults {
    /// A fresh plan snapshot where every field carries the brand value as
    /// its default and no user value.
    pub fn seed_plan(&self) -> PlanInput {
        let a = &self.assumptions;
        let financial_inputs = FinancialAssumptions {
            revenue: RevenueAssumptions {
                monthly_auv: FieldValue::brand(a.monthly_auv),
                growth_rates: PerYearField::brand_years(a.growth_rates),
                starting_month_auv_pct: FieldValue::brand(a.starting_month_auv_pct),
            },
            operating_costs: OperatingCostAssumptions {
                cogs_pct: PerYearField::brand_years(a.cogs_pct),
                labor_pct: PerYearField::brand_years(a.labor_pct),
                marketing_pct: PerYearField::brand_years(a.marketing_pct),
                royalty_pct: PerYearField::brand_years(a.royalty_pct),
                ad_fund_pct: PerYearField::brand_years(a.ad_fund_pct),
                payroll_tax_pct: PerYearField::brand_years(a.payroll_tax_pct),
                other_opex_pct: PerYearField::brand_years(a.other_opex_pct),
                facilities_annual: PerYearField::brand_years(a.facilities_annual),
                facilities_breakdown: None,
                management_salaries_annual: PerYearField::brand_years(a.management_salaries_annual),
            },
            profitability: ProfitabilityAssumptions {
                target_pretax_profit_pct: PerYearField::brand_years(a.target_pretax_profit_pct),
                shareholder_salary_adj: PerYearField::brand_years(a.shareholder_salary_adj),
                distributions: PerYearField::brand_years(a.distributions),
                non_capex_investment: PerYearField::brand_years(a.non_capex_investment),
                reinvestment_classification: a.reinvestment_classification,
                tax_rate: FieldValue::brand(a.tax_rate),
            },
            working_capital: WorkingCapitalAssumptions {
                ar_days: FieldValue::brand(a.ar_days),
                ap_days: FieldValue::brand(a.ap_days),
                inventory_days: FieldValue::brand(a.inventory_days),
                tax_payment_delay_months: FieldValue::brand(Decimal::from(a.tax_payment_delay_months)),
                ebitda_multiple: FieldValue::brand(a.ebitda_multiple),
            },
            financing: FinancingAssumptions {
                loan_amount: FieldValue::brand(a.loan_amount),
                interest_rate: FieldValue::brand(a.interest_rate),
                loan_term_months: FieldValue::brand(Decimal::from(a.loan_term_months)),
                down_payment_pct: FieldValue::brand(a.down_payment_pct),
            },
            startup_capital: StartupCapitalAssumptions {
                working_capital_months: FieldValue::brand(a.working_capital_months),
                depreciation_years: FieldValue::brand(a.depreciation_years),
            },
        };

        let mut startup_costs: Vec<StartupCostLineItem> = self
            .startup_costs
            .iter()
            .map(|item| StartupCostLineItem {
                is_custom: false,
                source: FieldSource::BrandDefault,
                brand_default_amount: Some(item.amount),
                ..item.clone()
            })
            .collect();
        normalize_sort_order(&mut startup_costs);

        PlanInput {
            financial_inputs,
            startup_costs,
        }
    }
}
