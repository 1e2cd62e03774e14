use clap::Args;
use serde::Serialize;
use serde_json::Value;

use franchise_projection_core::audit::{IdentityCheckResult, IdentitySummary};
use franchise_projection_core::projection::engine;
use franchise_projection_core::types::with_metadata;

use crate::input;

/// Arguments for the identity-check audit
#[derive(Args)]
pub struct AuditArgs {
    /// Path to the plan snapshot (JSON or YAML); reads JSON from stdin if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a brand-defaults file used to fill missing values
    #[arg(long)]
    pub brand: Option<String>,

    /// List only the checks that failed
    #[arg(long)]
    pub failed_only: bool,

    /// Exit with an error if any check fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct AuditReport {
    all_checks_passed: bool,
    total_checks: usize,
    failed_checks: usize,
    identity_summary: IdentitySummary,
    identity_checks: Vec<IdentityCheckResult>,
}

pub fn run_audit(args: AuditArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan = input::read_plan(args.input.as_deref())?;
    let brand = input::read_brand(args.brand.as_deref())?;
    let projection = engine::run_projections(&plan, brand.as_ref())?;

    let summary = projection.result.identity_summary;
    if args.strict && !summary.all_checks_passed {
        return Err(format!(
            "{} of {} identity checks failed",
            summary.failed, summary.total_checks
        )
        .into());
    }

    let identity_checks: Vec<IdentityCheckResult> = projection
        .result
        .identity_checks
        .into_iter()
        .filter(|c| !args.failed_only || !c.passed)
        .collect();

    let report = AuditReport {
        all_checks_passed: summary.all_checks_passed,
        total_checks: summary.total_checks,
        failed_checks: summary.failed,
        identity_summary: summary,
        identity_checks,
    };

    Ok(serde_json::to_value(with_metadata(
        "Accounting Identity Audit",
        &plan,
        projection.warnings,
        projection.metadata.computation_time_us,
        report,
    ))?)
}
