use serde_json::Value;

use super::{cell, result_of};

/// Headline answers, checked in this order one level deep.
const PRIORITY_KEYS: [&str; 5] = [
    "all_checks_passed",
    "five_year_roi_pct",
    "break_even_month",
    "estimated_value",
    "total_startup_investment",
];

/// Print just the key answer from the output.
///
/// Scenario comparisons print one `scenario: roi` line per scenario; other
/// results print the first priority key found at the top level or inside
/// one of its objects.
pub fn print_minimal(value: &Value) {
    let result = result_of(value);

    if let Some(Value::Array(rows)) = result.get("metrics") {
        for row in rows {
            println!(
                "{}: {}",
                row.get("scenario").map(|v| cell(v, "?")).unwrap_or_default(),
                row.get("five_year_roi_pct").map(|v| cell(v, "null")).unwrap_or_default()
            );
        }
        return;
    }

    if let Some(val) = find_priority(result) {
        println!("{}", cell(val, "null"));
        return;
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        println!("{key}: {}", cell(val, "null"));
        return;
    }

    println!("{}", cell(result, "null"));
}

fn find_priority(result: &Value) -> Option<&Value> {
    let map = result.as_object()?;
    PRIORITY_KEYS.iter().find_map(|key| {
        map.get(*key)
            .or_else(|| {
                map.values()
                    .filter_map(Value::as_object)
                    .find_map(|nested| nested.get(*key))
            })
            .filter(|v| !v.is_null())
    })
}
