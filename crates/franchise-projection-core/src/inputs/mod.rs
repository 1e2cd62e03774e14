pub mod assumptions;
pub mod brand_defaults;
pub mod field_value;
pub mod normalize;
pub mod startup_costs;

pub use assumptions::{FinancialAssumptions, PlanInput};
pub use brand_defaults::BrandDefaults;
pub use field_value::{FieldSource, FieldValue, Item7Range, PerYearField};
pub use normalize::{normalize_plan, NormalizedAssumptions, NormalizedPlan};
pub use startup_costs::{CapexClassification, StartupCostLineItem, StartupCostTotals};
