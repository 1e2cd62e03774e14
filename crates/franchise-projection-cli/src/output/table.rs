use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, result_of};

/// Arrays up to this long print transposed (one column per entry).
const TRANSPOSE_MAX: usize = 12;

/// Format output as tables using the tabled crate.
///
/// Scalars of the result print as a Field/Value table; every array of
/// objects (annual summaries, identity checks, scenario metrics) prints as
/// its own titled table.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match result {
        Value::Object(map) => print_object(map),
        Value::Array(arr) => print_array(arr),
        _ => println!("{result}"),
    }

    if let Some(envelope) = value.as_object().filter(|m| m.contains_key("result")) {
        print_footer(envelope);
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&String, &Value)> = Vec::new();
    let mut has_fields = false;

    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => sections.push((key, val)),
            Value::Object(nested) if nested.values().all(|v| !v.is_object() && !v.is_array()) => {
                for (sub, v) in nested {
                    builder.push_record([format!("{key}.{sub}"), cell(v, "null")]);
                    has_fields = true;
                }
            }
            Value::Object(_) => sections.push((key, val)),
            _ => {
                builder.push_record([key.clone(), cell(val, "null")]);
                has_fields = true;
            }
        }
    }

    if has_fields {
        println!("{}", Table::from(builder));
    }

    for (key, val) in sections {
        println!("\n{key}:");
        match val {
            Value::Array(arr) => print_array(arr),
            Value::Object(nested) => print_object(nested),
            _ => {}
        }
    }
}

fn print_array(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", cell(item, "null"));
        }
        if arr.is_empty() {
            println!("(empty)");
        }
        return;
    };

    let headers: Vec<&String> = first
        .iter()
        .filter(|(_, v)| !v.is_object() && !v.is_array())
        .map(|(k, _)| k)
        .collect();
    let field = |item: &Value, h: &str| item.get(h).map(|v| cell(v, "")).unwrap_or_default();

    let mut builder = Builder::default();
    if arr.len() <= TRANSPOSE_MAX {
        for h in &headers {
            let mut row = vec![h.to_string()];
            row.extend(arr.iter().map(|item| field(item, h)));
            builder.push_record(row);
        }
    } else {
        builder.push_record(headers.iter().map(|h| h.to_string()));
        for item in arr {
            builder.push_record(headers.iter().map(|h| field(item, h)));
        }
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}
