use clap::Args;
use serde_json::Value;

use franchise_projection_core::inputs::BrandDefaults;

use crate::input;

/// Arguments for seeding a new plan
#[derive(Args)]
pub struct SeedArgs {
    /// Path to the brand-defaults file (JSON or YAML)
    #[arg(long)]
    pub brand: String,
}

pub fn run_seed(args: SeedArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let brand: BrandDefaults = input::file::read_document(&args.brand)?;
    Ok(serde_json::to_value(brand.seed_plan())?)
}
