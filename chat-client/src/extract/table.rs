//! Markdown pipe tables.

use serde_json::{Map, Number, Value};

fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_row(line: &str) -> bool {
    line.contains('|') && !line.trim().is_empty()
}

/// `| --- | :---: |` and friends.
fn is_separator(line: &str) -> bool {
    if !line.contains('-') || !is_row(line) {
        return false;
    }
    split_cells(line).iter().all(|cell| {
        let cell = cell.trim_matches(':');
        !cell.is_empty() && cell.chars().all(|c| c == '-')
    })
}

/// Turn a numeric-looking cell into a JSON number. Integers stay integers.
pub fn coerce_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }

    let numeric_chars = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if numeric_chars && trimmed.chars().any(|c| c.is_ascii_digit()) {
        if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }

    Value::String(cell.to_string())
}

fn rows_for(headers: &[String], lines: &[&str]) -> Vec<Value> {
    lines
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| cells.len() == headers.len())
        .map(|cells| {
            let row: Map<String, Value> = headers
                .iter()
                .cloned()
                .zip(cells.iter().map(|cell| coerce_cell(cell)))
                .collect();
            Value::Object(row)
        })
        .collect()
}

/// Rows of the first table in `text` that keeps at least one data row.
///
/// Rows whose cell count differs from the header's are dropped.
pub fn parse_markdown_table(text: &str) -> Option<Vec<Value>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut index = 0;

    while index + 1 < lines.len() {
        if !is_row(lines[index]) || !is_separator(lines[index + 1]) {
            index += 1;
            continue;
        }

        let headers = split_cells(lines[index]);
        let body_start = index + 2;
        let body_end = lines[body_start..]
            .iter()
            .position(|line| !is_row(line))
            .map_or(lines.len(), |offset| body_start + offset);

        let rows = rows_for(&headers, &lines[body_start..body_end]);
        if !rows.is_empty() {
            return Some(rows);
        }
        index = body_end.max(index + 1);
    }

    None
}
