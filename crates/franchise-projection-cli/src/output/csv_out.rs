use serde_json::Value;
use std::io;

use super::{cell, result_of};

/// Row-shaped sections, most useful first.
const ROW_SECTIONS: [&str; 4] = [
    "monthly_projections",
    "identity_checks",
    "metrics",
    "annual_summaries",
];

/// Write output as CSV to stdout.
///
/// The first row-shaped section of the result (monthly projections, audit
/// checks or scenario metrics) is written one record per row; anything else
/// becomes a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    let rows = ROW_SECTIONS
        .iter()
        .find_map(|key| result.get(*key).and_then(Value::as_array));

    match (rows, result) {
        (Some(rows), _) => write_rows(&mut wtr, rows),
        (None, Value::Array(rows)) => write_rows(&mut wtr, rows),
        (None, Value::Object(map)) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &cell(val, "")]);
            }
        }
        (None, other) => {
            let _ = wtr.write_record([&cell(other, "")]);
        }
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([&cell(item, "")]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);

    for item in rows {
        let row: Vec<String> = headers
            .iter()
            .map(|h| item.get(*h).map(|v| cell(v, "")).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}
