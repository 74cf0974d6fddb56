// src/extract.rs
use serde_json::Value;

use crate::data_types::{CellValue, Row, TableSpec};

/// Turns a raw grid (first row = headers) into keyed rows.
///
/// Headers that are empty or not allowed by `spec` are skipped. Short
/// rows are padded with empty text. Rows left with no keys are dropped;
/// everything else keeps its input order.
pub fn extract_rows(grid: &[Vec<Value>], spec: &TableSpec) -> Vec<Row> {
    let Some((headers, body)) = grid.split_first() else {
        return Vec::new();
    };

    let visible_columns: Vec<Option<String>> = headers
        .iter()
        .map(|header| {
            let header = header_text(header);
            if !header.is_empty() && spec.allows(&header) {
                Some(header)
            } else {
                None
            }
        })
        .collect();

    body.iter()
        .filter_map(|cells| {
            let mut row = Row::new();
            for (i, header) in visible_columns.iter().enumerate() {
                let Some(header) = header else { continue };
                let value = cells.get(i).map(CellValue::from).unwrap_or_else(CellValue::empty);
                row.insert(header, value);
            }
            (!row.is_empty()).then_some(row)
        })
        .collect()
}

fn header_text(header: &Value) -> String {
    match header {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
