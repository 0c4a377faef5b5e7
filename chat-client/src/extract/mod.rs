pub mod chart;
pub mod references;
pub mod table;
pub mod visualization;

pub use chart::{suggest_chart_type, suggest_for_rows, ChartType};
pub use references::{extract_document_references, DocumentReference, ReferenceKind};
pub use visualization::{
    extract_visualization_from_message, ExtractedVisualization, VisualizationKind,
    VisualizationSource,
};

use serde::Serialize;
use serde_json::Value;

/// Everything worth rendering next to one assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageInsights {
    pub visualization: Option<ExtractedVisualization>,
    pub chart_type: Option<ChartType>,
    pub references: Vec<DocumentReference>,
}

/// Rows to chart: the data itself, or its `data` field.
fn chart_rows(data: &Value) -> Option<&[Value]> {
    match data {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => map.get("data").and_then(Value::as_array).map(Vec::as_slice),
        _ => None,
    }
}

pub fn analyze_message(text: &str) -> MessageInsights {
    let visualization = extract_visualization_from_message(text);
    let chart_type = visualization
        .as_ref()
        .filter(|v| v.kind != VisualizationKind::Mermaid)
        .and_then(|v| chart_rows(&v.data))
        .map(suggest_for_rows);

    MessageInsights {
        visualization,
        chart_type,
        references: extract_document_references(text),
    }
}
