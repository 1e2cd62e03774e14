use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, info_span};

use crate::audit::{run_identity_checks, summarize_checks, AuditSubject, IdentityCheckResult, IdentitySummary};
use crate::inputs::{normalize_plan, BrandDefaults, NormalizedPlan, PlanInput};
use crate::projection::annual::{annualize, AnnualSummary};
use crate::projection::loan::LoanSchedule;
use crate::projection::metrics::{roi_metrics, roic_extended, valuation, RoiMetrics, RoicYear, ValuationOutput};
use crate::projection::monthly::{simulate_months, MonthlyProjection, OpeningPosition};
use crate::types::*;
use crate::ProjectionResult;

/// `{financial_inputs, startup_costs}`: the plan snapshot the engine reads.
pub type EngineInput = PlanInput;

/// Full projection for one plan. Built fresh on every run and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub opening_position: OpeningPosition,
    pub monthly_projections: Vec<MonthlyProjection>,
    pub annual_summaries: Vec<AnnualSummary>,
    pub roi_metrics: RoiMetrics,
    pub roic_extended: Vec<RoicYear>,
    pub valuation: ValuationOutput,
    pub loan_schedule: LoanSchedule,
    pub identity_checks: Vec<IdentityCheckResult>,
    pub identity_summary: IdentitySummary,
    pub warnings: Vec<String>,
}

impl EngineOutput {
    pub fn all_checks_passed(&self) -> bool {
        self.identity_summary.all_checks_passed
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize a plan snapshot and project it. Errors only on malformed
/// input; economically infeasible plans project normally.
pub fn calculate_projections(input: &EngineInput) -> ProjectionResult<EngineOutput> {
    calculate_projections_with_brand(input, None)
}

/// As [`calculate_projections`], resolving missing values against a
/// brand's defaults.
pub fn calculate_projections_with_brand(
    input: &EngineInput,
    brand: Option<&BrandDefaults>,
) -> ProjectionResult<EngineOutput> {
    let plan = normalize_plan(input, brand)?;
    Ok(project_plan(&plan))
}

/// Run the pipeline on an already-normalized plan:
/// simulate → annualize → metrics → audit.
pub fn project_plan(plan: &NormalizedPlan) -> EngineOutput {
    let span = info_span!("projection", startup_items = plan.startup_costs.len());
    let _guard = span.enter();

    let a = &plan.assumptions;
    let simulation = simulate_months(a, &plan.startup_costs);
    let annual_summaries = annualize(&simulation.months, a);
    let roi = roi_metrics(&simulation.opening, &simulation.months);
    let roic = roic_extended(&simulation.opening, &annual_summaries);
    let valuation = valuation(a, &annual_summaries, &roi);

    let identity_checks = run_identity_checks(&AuditSubject {
        assumptions: a,
        startup_costs: &plan.startup_costs,
        simulation: &simulation,
        annual: &annual_summaries,
        roi: &roi,
        valuation: &valuation,
    });
    let identity_summary = summarize_checks(&identity_checks);

    let warnings = collect_warnings(plan, &simulation.months, &roi, &identity_checks);

    info!(
        checks = identity_summary.total_checks,
        failed = identity_summary.failed,
        break_even_month = ?roi.break_even_month,
        "projection complete"
    );

    EngineOutput {
        opening_position: simulation.opening,
        monthly_projections: simulation.months,
        annual_summaries,
        roi_metrics: roi,
        roic_extended: roic,
        valuation,
        loan_schedule: simulation.loan,
        identity_checks,
        identity_summary,
        warnings,
    }
}

/// [`calculate_projections_with_brand`] wrapped in the standard output
/// envelope.
pub fn run_projections(
    input: &EngineInput,
    brand: Option<&BrandDefaults>,
) -> ProjectionResult<ComputationOutput<EngineOutput>> {
    let start = Instant::now();
    let output = calculate_projections_with_brand(input, brand)?;
    let warnings = output.warnings.clone();
    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "60-Month Franchise Projection with Accounting Identity Checks",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(
    plan: &NormalizedPlan,
    months: &[MonthlyProjection],
    roi: &RoiMetrics,
    checks: &[IdentityCheckResult],
) -> Vec<String> {
    let mut warnings = plan.advisories.clone();

    let negative: Vec<&MonthlyProjection> = months.iter().filter(|m| m.ending_cash < 0).collect();
    if let (Some(first), Some(lowest)) = (
        negative.first(),
        negative.iter().min_by_key(|m| m.ending_cash),
    ) {
        warnings.push(format!(
            "Ending cash is negative in {} month(s), first in month {}; lowest {} in month {}",
            negative.len(),
            first.month,
            lowest.ending_cash,
            lowest.month
        ));
    }

    if roi.break_even_month.is_none() {
        warnings.push("Break-even not reached within 60 months".into());
    }

    for check in checks.iter().filter(|c| !c.passed) {
        debug!(category = ?check.category, name = %check.name, "identity check failed");
        warnings.push(format!(
            "Identity check failed: {} (expected {}, actual {}, tolerance {})",
            check.name, check.expected, check.actual, check.tolerance
        ));
    }

    warnings
}
