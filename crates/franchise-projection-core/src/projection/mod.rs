pub mod annual;
pub mod depreciation;
pub mod engine;
pub mod loan;
pub mod metrics;
pub mod monthly;

pub use engine::{
    calculate_projections, calculate_projections_with_brand, project_plan, run_projections,
    EngineInput, EngineOutput,
};
