#![allow(dead_code)]

use franchise_projection_core::inputs::assumptions::{
    FacilitiesBreakdown, FinancingAssumptions, OperatingCostAssumptions, ProfitabilityAssumptions,
    RevenueAssumptions, StartupCapitalAssumptions, WorkingCapitalAssumptions,
};
use franchise_projection_core::inputs::{
    CapexClassification, FieldValue, FinancialAssumptions, PerYearField, PlanInput,
    StartupCostLineItem,
};
use rust_decimal_macros::dec;

/// $150,000 loan at 6.5% over 84 months with 20% down.
pub fn financing() -> FinancingAssumptions {
    FinancingAssumptions {
        loan_amount: FieldValue::user(15_000_000),
        interest_rate: FieldValue::user(dec!(0.065)),
        loan_term_months: FieldValue::user(dec!(84)),
        down_payment_pct: FieldValue::user(dec!(0.20)),
    }
}

pub fn startup_costs() -> Vec<StartupCostLineItem> {
    vec![
        StartupCostLineItem::new("equipment", "Equipment", 8_000_000, CapexClassification::Capex, 0),
        StartupCostLineItem::new("build_out", "Leasehold improvements", 6_000_000, CapexClassification::Capex, 1),
        StartupCostLineItem::new("franchise_fee", "Initial franchise fee", 3_500_000, CapexClassification::NonCapex, 2),
        StartupCostLineItem::new("opening_inventory", "Opening inventory", 1_000_000, CapexClassification::WorkingCapital, 3),
    ]
}

/// $5,000/month AUV, growth 5% then 3%, COGS 30%, labor 25%, rent
/// $3,000/month, 3 months of working capital, 10-year depreciation.
pub fn canonical_plan() -> PlanInput {
    PlanInput {
        financial_inputs: FinancialAssumptions {
            revenue: RevenueAssumptions {
                monthly_auv: FieldValue::user(500_000),
                growth_rates: PerYearField::user_years([
                    dec!(0.05),
                    dec!(0.05),
                    dec!(0.03),
                    dec!(0.03),
                    dec!(0.03),
                ]),
                starting_month_auv_pct: FieldValue::user(dec!(0.6)),
            },
            operating_costs: OperatingCostAssumptions {
                cogs_pct: PerYearField::uniform(FieldValue::user(dec!(0.30))),
                labor_pct: PerYearField::uniform(FieldValue::user(dec!(0.25))),
                facilities_breakdown: Some(FacilitiesBreakdown {
                    rent: PerYearField::uniform(FieldValue::user(3_600_000)),
                    ..Default::default()
                }),
                ..Default::default()
            },
            profitability: ProfitabilityAssumptions {
                tax_rate: FieldValue::user(dec!(0.21)),
                ..Default::default()
            },
            working_capital: WorkingCapitalAssumptions {
                ebitda_multiple: FieldValue::user(dec!(3)),
                ..Default::default()
            },
            financing: financing(),
            startup_capital: StartupCapitalAssumptions {
                working_capital_months: FieldValue::user(dec!(3)),
                depreciation_years: FieldValue::user(dec!(10)),
            },
        },
        startup_costs: startup_costs(),
    }
}

/// A location that pays back its investment inside five years, with every
/// cost line, working-capital day count and owner flow populated.
pub fn profitable_plan() -> PlanInput {
    let mut plan = canonical_plan();
    let fi = &mut plan.financial_inputs;

    fi.revenue.monthly_auv = FieldValue::user(6_000_000);
    fi.operating_costs.royalty_pct = PerYearField::uniform(FieldValue::user(dec!(0.06)));
    fi.operating_costs.ad_fund_pct = PerYearField::uniform(FieldValue::user(dec!(0.02)));
    fi.operating_costs.marketing_pct = PerYearField::uniform(FieldValue::user(dec!(0.02)));
    fi.operating_costs.payroll_tax_pct = PerYearField::uniform(FieldValue::user(dec!(0.10)));
    fi.operating_costs.other_opex_pct = PerYearField::uniform(FieldValue::user(dec!(0.03)));
    fi.operating_costs.management_salaries_annual =
        PerYearField::uniform(FieldValue::user(4_800_000));
    fi.profitability = ProfitabilityAssumptions {
        target_pretax_profit_pct: PerYearField::uniform(FieldValue::user(dec!(0.10))),
        shareholder_salary_adj: PerYearField::uniform(FieldValue::user(2_400_000)),
        distributions: PerYearField::user_years([0, 1_200_000, 2_400_000, 2_400_000, 2_400_000]),
        non_capex_investment: PerYearField::user_years([0, 0, 1_500_000, 0, 0]),
        reinvestment_classification: CapexClassification::Capex,
        tax_rate: FieldValue::user(dec!(0.21)),
    };
    fi.working_capital = WorkingCapitalAssumptions {
        ar_days: FieldValue::user(dec!(3)),
        ap_days: FieldValue::user(dec!(20)),
        inventory_days: FieldValue::user(dec!(12)),
        tax_payment_delay_months: FieldValue::user(dec!(3)),
        ebitda_multiple: FieldValue::user(dec!(3.5)),
    };
    plan
}
