pub mod file;
pub mod stdin;

use franchise_projection_core::inputs::{BrandDefaults, PlanInput};

/// Load a plan snapshot from `--input`, falling back to piped stdin.
pub fn read_plan(path: Option<&str>) -> Result<PlanInput, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_document(path)
    } else if let Some(text) = stdin::read_piped()? {
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse stdin: {e}").into())
    } else {
        Err("--input <plan.json|plan.yaml> or stdin required".into())
    }
}

pub fn read_brand(path: Option<&str>) -> Result<Option<BrandDefaults>, Box<dyn std::error::Error>> {
    path.map(file::read_document::<BrandDefaults>).transpose()
}
