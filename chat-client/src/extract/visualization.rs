//! Structured data embedded in assistant replies.
//!
//! Each extractor looks for one shape. [`extract_visualization_from_message`]
//! tries them in a fixed order and returns the first hit.

use crate::extract::table::parse_markdown_table;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static VISUALIZATION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```visualization[ \t]*\r?\n(.*?)```").expect("valid visualization block regex")
});

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```([A-Za-z0-9_+-]*)[ \t]*\r?\n(.*?)```").expect("valid fenced block regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    Chart,
    Table,
    Data,
    Mermaid,
}

/// Which extractor produced a visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationSource {
    VisualizationBlock,
    MarkdownTable,
    JsonBlock,
    MermaidBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedVisualization {
    #[serde(rename = "type")]
    pub kind: VisualizationKind,
    pub data: Value,
    pub source: VisualizationSource,
}

impl ExtractedVisualization {
    fn new(kind: VisualizationKind, data: Value, source: VisualizationSource) -> Self {
        Self { kind, data, source }
    }
}

type Extractor = fn(&str) -> Option<ExtractedVisualization>;

const EXTRACTORS: &[(&str, Extractor)] = &[
    ("visualization_block", visualization_block),
    ("markdown_table", markdown_table),
    ("json_block", json_block),
    ("mermaid_block", mermaid_block),
];

pub fn extract_visualization_from_message(text: &str) -> Option<ExtractedVisualization> {
    EXTRACTORS.iter().find_map(|(name, extractor)| {
        let found = extractor(text);
        if found.is_some() {
            tracing::debug!(extractor = *name, "Visualization found in message");
        }
        found
    })
}

/// ```` ```visualization ```` block holding JSON. Blocks that fail to parse
/// are ignored.
pub fn visualization_block(text: &str) -> Option<ExtractedVisualization> {
    VISUALIZATION_BLOCK.captures_iter(text).find_map(|captures| {
        let body = captures.get(1)?.as_str();
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(data) => Some(ExtractedVisualization::new(
                VisualizationKind::Chart,
                data,
                VisualizationSource::VisualizationBlock,
            )),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping visualization block with invalid JSON");
                None
            }
        }
    })
}

pub fn markdown_table(text: &str) -> Option<ExtractedVisualization> {
    parse_markdown_table(text).map(|rows| {
        ExtractedVisualization::new(
            VisualizationKind::Table,
            Value::Array(rows),
            VisualizationSource::MarkdownTable,
        )
    })
}

/// A rendered visualization needs at least one numeric field to plot.
fn is_plottable(rows: &[Value]) -> bool {
    rows.iter().all(Value::is_object)
        && rows
            .first()
            .and_then(Value::as_object)
            .is_some_and(|first| first.values().any(Value::is_number))
}

/// ```` ```json ```` or unlabeled block with an array of numeric records.
pub fn json_block(text: &str) -> Option<ExtractedVisualization> {
    FENCED_BLOCK
        .captures_iter(text)
        .filter(|captures| {
            let language = captures.get(1).map_or("", |m| m.as_str());
            language.is_empty() || language.eq_ignore_ascii_case("json")
        })
        .filter_map(|captures| serde_json::from_str::<Value>(captures.get(2)?.as_str().trim()).ok())
        .find(|data| data.as_array().is_some_and(|rows| is_plottable(rows)))
        .map(|data| {
            ExtractedVisualization::new(VisualizationKind::Data, data, VisualizationSource::JsonBlock)
        })
}

pub fn mermaid_block(text: &str) -> Option<ExtractedVisualization> {
    FENCED_BLOCK
        .captures_iter(text)
        .find(|captures| captures.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case("mermaid")))
        .and_then(|captures| captures.get(2))
        .map(|body| {
            ExtractedVisualization::new(
                VisualizationKind::Mermaid,
                Value::String(body.as_str().trim().to_string()),
                VisualizationSource::MermaidBlock,
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_visualization_block() {
        let found = extract_visualization_from_message("```visualization\n{\"a\":1}\n```").unwrap();
        assert_eq!(
            serde_json::to_value(&found).unwrap(),
            json!({"type": "chart", "data": {"a": 1}, "source": "visualization_block"})
        );
    }

    #[test]
    fn test_invalid_visualization_falls_through() {
        let text = "```visualization\n{not json}\n```\n\n| x | y |\n|---|---|\n| a | 1 |";
        let found = extract_visualization_from_message(text).unwrap();
        assert_eq!(found.kind, VisualizationKind::Table);
        assert_eq!(found.source, VisualizationSource::MarkdownTable);
    }

    #[test]
    fn test_first_match_wins_over_later_shapes() {
        let text = "```visualization\n{\"type\":\"bar\"}\n```\n\n```mermaid\ngraph TD; A-->B\n```";
        assert_eq!(
            extract_visualization_from_message(text).unwrap().source,
            VisualizationSource::VisualizationBlock
        );
    }

    #[test]
    fn test_json_block_requires_numeric_field() {
        let text = "```json\n[{\"name\":\"a\"}]\n```\n\n```\n[{\"name\":\"b\",\"total\":3}]\n```";
        let found = json_block(text).unwrap();
        assert_eq!(found.kind, VisualizationKind::Data);
        assert_eq!(found.data, json!([{"name": "b", "total": 3}]));

        assert!(json_block("```json\n[{\"name\":\"a\"}]\n```").is_none());
        assert!(json_block("```json\n{\"total\":3}\n```").is_none());
    }

    #[test]
    fn test_mermaid_block() {
        let found = extract_visualization_from_message("Veja:\n```mermaid\n  graph TD; A-->B  \n```").unwrap();
        assert_eq!(found.kind, VisualizationKind::Mermaid);
        assert_eq!(found.data, json!("graph TD; A-->B"));
    }

    #[test]
    fn test_plain_text_has_no_visualization() {
        assert!(extract_visualization_from_message("Nada para mostrar aqui.").is_none());
    }
}
