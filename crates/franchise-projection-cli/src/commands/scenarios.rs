use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use franchise_projection_core::scenarios::{self, SensitivityKnobs};

use crate::input;

/// Arguments for the scenario comparison. Any knob adds a custom scenario.
#[derive(Args)]
pub struct ScenarioArgs {
    /// Path to the plan snapshot (JSON or YAML); reads JSON from stdin if omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a brand-defaults file used to fill missing values
    #[arg(long)]
    pub brand: Option<String>,

    /// Revenue change in percent (-50 to 50, step 1)
    #[arg(long, allow_hyphen_values = true)]
    pub revenue: Option<Decimal>,

    /// COGS change in percentage points (-10 to 10, step 0.5)
    #[arg(long, allow_hyphen_values = true)]
    pub cogs: Option<Decimal>,

    /// Labor change in percent (-30 to 30, step 1)
    #[arg(long, allow_hyphen_values = true)]
    pub labor: Option<Decimal>,

    /// Marketing change in percent (-50 to 50, step 1)
    #[arg(long, allow_hyphen_values = true)]
    pub marketing: Option<Decimal>,

    /// Facilities change in percent (-30 to 30, step 1)
    #[arg(long, allow_hyphen_values = true)]
    pub facilities: Option<Decimal>,
}

impl ScenarioArgs {
    fn knobs(&self) -> Option<SensitivityKnobs> {
        let knobs = [
            self.revenue,
            self.cogs,
            self.labor,
            self.marketing,
            self.facilities,
        ];
        if knobs.iter().all(Option::is_none) {
            return None;
        }
        Some(SensitivityKnobs {
            revenue: self.revenue.unwrap_or_default(),
            cogs: self.cogs.unwrap_or_default(),
            labor: self.labor.unwrap_or_default(),
            marketing: self.marketing.unwrap_or_default(),
            facilities: self.facilities.unwrap_or_default(),
        })
    }
}

pub fn run_scenarios(args: ScenarioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let plan = input::read_plan(args.input.as_deref())?;
    let brand = input::read_brand(args.brand.as_deref())?;
    let knobs = args.knobs();
    let result = scenarios::run_scenarios(&plan, brand.as_ref(), knobs.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
