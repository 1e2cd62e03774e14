use clap::Args;
use serde_json::Value;

use franchise_projection_core::projection::engine;

use crate::input;

/// Arguments for the full projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to the plan snapshot (JSON or YAML); reads JSON from stdin if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a brand-defaults file used to fill missing values
    #[arg(long)]
    pub brand: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan = input::read_plan(args.input.as_deref())?;
    let brand = input::read_brand(args.brand.as_deref())?;
    let result = engine::run_projections(&plan, brand.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
