//! Pick a chart type for a set of rows.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Pie charts stop being readable past this many slices.
const MAX_PIE_ROWS: usize = 8;
const MIN_SCATTER_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Table,
}

pub fn is_date_like(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }

    DateTime::parse_from_rfc3339(value).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|format| NaiveDate::parse_from_str(value, format).is_ok())
        || NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").is_ok()
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FieldCounts {
    numeric: usize,
    date: usize,
    string: usize,
}

fn classify_fields(row: &serde_json::Map<String, Value>) -> FieldCounts {
    let mut counts = FieldCounts::default();
    for value in row.values() {
        match value {
            Value::Number(_) => counts.numeric += 1,
            Value::String(s) if is_date_like(s) => counts.date += 1,
            Value::String(_) => counts.string += 1,
            _ => {}
        }
    }
    counts
}

/// Chart type for `data`; anything but a non-empty array of objects is a table.
pub fn suggest_chart_type(data: &Value) -> ChartType {
    match data {
        Value::Array(rows) => suggest_for_rows(rows),
        _ => ChartType::Table,
    }
}

/// Decide from the fields of the first row and the number of rows.
pub fn suggest_for_rows(rows: &[Value]) -> ChartType {
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return ChartType::Table;
    };
    let counts = classify_fields(first);

    if counts.numeric == 2 && rows.len() > MIN_SCATTER_ROWS {
        ChartType::Scatter
    } else if counts.date >= 1 && counts.numeric >= 1 {
        ChartType::Line
    } else if counts.numeric >= 2 {
        ChartType::Bar
    } else if counts.numeric == 1 && counts.string >= 1 {
        if rows.len() <= MAX_PIE_ROWS {
            ChartType::Pie
        } else {
            ChartType::Bar
        }
    } else {
        ChartType::Table
    }
}
