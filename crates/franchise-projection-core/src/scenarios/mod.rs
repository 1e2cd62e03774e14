pub mod scenario;
pub mod sensitivity;

pub use scenario::{
    apply_shifts, run_scenario_comparison, run_scenarios, ScenarioComparison, ScenarioKind,
    ScenarioMetrics, ScenarioShifts,
};
pub use sensitivity::{SensitivityKnobs, SliderBounds};
