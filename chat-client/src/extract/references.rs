//! Mentions of source documents inside an assistant reply.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `no documento "Plano 2024"`
static MENTIONED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bno\s+(?:documento|arquivo)\s+["“'«]([^"”'»\n]+)["”'»]"#)
        .expect("valid mentioned-document regex")
});

/// `de acordo com o documento relatorio.pdf`
static CITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(?:de\s+acordo\s+com|conforme|segundo|baseado\s+em)\s+(?:(?:o|a|os|as)\s+)?(?:(?:documento|arquivo)\s+)?["“']?([\w.-]+\.[A-Za-z][A-Za-z0-9]{1,4})\b"#,
    )
    .expect("valid cited-document regex")
});

/// `Fonte: relatorio.pdf`
static SOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:\bFonte|\bReferência|\bReferencia|\bRef\.)\s*:\s*["“']?([\w.-]+\.[A-Za-z][A-Za-z0-9]{1,4})\b"#)
        .expect("valid source-document regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Mentioned,
    Cited,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    /// Full text matched by the pattern.
    pub context: String,
}

/// Every reference in `text`, grouped by pattern: mentioned, then cited,
/// then source.
pub fn extract_document_references(text: &str) -> Vec<DocumentReference> {
    let patterns: [(&Regex, ReferenceKind); 3] = [
        (&MENTIONED, ReferenceKind::Mentioned),
        (&CITED, ReferenceKind::Cited),
        (&SOURCE, ReferenceKind::Source),
    ];

    patterns
        .into_iter()
        .flat_map(|(pattern, kind)| {
            pattern.captures_iter(text).filter_map(move |captures| {
                let name = captures.get(1)?.as_str().trim();
                Some(DocumentReference {
                    name: name.to_string(),
                    kind,
                    context: captures.get(0)?.as_str().to_string(),
                })
            })
        })
        .collect()
}
