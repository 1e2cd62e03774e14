pub mod audit;
pub mod error;
pub mod inputs;
pub mod projection;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::ProjectionError;
pub use projection::{calculate_projections, run_projections, EngineInput, EngineOutput};
pub use types::*;

/// Standard result type for all engine operations
pub type ProjectionResult<T> = Result<T, ProjectionError>;
