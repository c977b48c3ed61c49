//! Document-attribution markers inside an evidence narrative.
//!
//! A marker looks like `From DOC-A:` or `from document spec-2, clause 4:` and
//! attributes the text that follows it (up to the next marker) to a document.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)from\s+(?:document\s+)?([a-z0-9._-]+)(?:\s*,[^:\n]+)?\s*:")
        .expect("valid reference marker regex")
});

/// One marker occurrence: the byte span of the whole marker and the document
/// token as written in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub span: Range<usize>,
    pub token: String,
}

/// Tokenize `text` into marker matches, in order of appearance.
///
/// Pure: every call scans from the start of `text`, nothing is carried over
/// between calls.
pub fn scan_markers(text: &str) -> Vec<MarkerMatch> {
    MARKER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let token = caps.get(1)?;
            Some(MarkerMatch {
                span: whole.range(),
                token: token.as_str().to_string(),
            })
        })
        .collect()
}

/// Case-insensitive lookup from marker tokens to a finding's reference ids.
#[derive(Debug, Clone, Default)]
pub struct ReferenceKeys {
    ordered: Vec<String>,
    by_key: HashMap<String, usize>,
}

impl ReferenceKeys {
    /// Build from raw references: trimmed, empties dropped, duplicates removed
    /// keeping first-seen order. When two ids differ only by case the first
    /// one owns the key.
    pub fn new(references: &[String]) -> Self {
        let mut keys = Self::default();
        for reference in references {
            let id = reference.trim();
            if id.is_empty() || keys.ordered.iter().any(|known| known == id) {
                continue;
            }
            keys.ordered.push(id.to_string());
            let index = keys.ordered.len() - 1;
            keys.by_key.entry(id.to_lowercase()).or_insert(index);
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Resolve a marker token to the reference id it names, if any.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        let index = *self.by_key.get(&token.trim().to_lowercase())?;
        self.ordered.get(index).map(String::as_str)
    }
}

/// A slice of the narrative attributed to one reference id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedSegment<'a> {
    pub document_id: String,
    pub text: &'a str,
}

/// Split `evidence` into attributed segments.
///
/// A segment runs from the end of its marker to the start of the next marker
/// of any kind, so text behind a marker for an unknown document is dropped
/// rather than leaking into the previous segment. Returns nothing when no
/// marker names a known reference.
pub fn attributed_segments<'a>(evidence: &'a str, keys: &ReferenceKeys) -> Vec<MarkedSegment<'a>> {
    let markers = scan_markers(evidence);
    let mut segments = Vec::new();

    for (index, marker) in markers.iter().enumerate() {
        let Some(document_id) = keys.resolve(&marker.token) else {
            continue;
        };
        let end = markers
            .get(index + 1)
            .map(|next| next.span.start)
            .unwrap_or(evidence.len());
        segments.push(MarkedSegment {
            document_id: document_id.to_string(),
            text: &evidence[marker.span.end..end],
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_markers_variants() {
        let text = "From DOC-A: x. from document spec_2.v1, clause 4: y. FROM c3 : z";
        let tokens: Vec<_> = scan_markers(text).into_iter().map(|m| m.token).collect();
        assert_eq!(tokens, vec!["DOC-A", "spec_2.v1", "c3"]);
    }

    #[test]
    fn test_scan_markers_is_repeatable() {
        let text = "From A: one From B: two";
        assert_eq!(scan_markers(text), scan_markers(text));
        assert_eq!(scan_markers(text)[1].span, 12..19);
    }

    #[test]
    fn test_marker_comment_cannot_cross_newline() {
        let text = "from DOC-A, see below\nand: more";
        assert!(scan_markers(text).is_empty());
    }

    #[test]
    fn test_reference_keys_case_insensitive() {
        let keys = ReferenceKeys::new(&refs(&[" DOC-A ", "doc-b", "DOC-A", ""]));
        assert_eq!(keys.ordered, vec!["DOC-A".to_string(), "doc-b".to_string()]);
        assert_eq!(keys.resolve("doc-a"), Some("DOC-A"));
        assert_eq!(keys.resolve("DOC-B"), Some("doc-b"));
        assert_eq!(keys.resolve("DOC-C"), None);
    }

    #[test]
    fn test_attributed_segments_drop_unknown_marker() {
        let keys = ReferenceKeys::new(&refs(&["DOC-A"]));
        let text = r#"From DOC-A: "kept" From DOC-X: "dropped""#;
        let segments = attributed_segments(text, &keys);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].document_id, "DOC-A");
        assert_eq!(segments[0].text, r#" "kept" "#);
    }

    #[test]
    fn test_attributed_segments_none_without_markers() {
        let keys = ReferenceKeys::new(&refs(&["DOC-A"]));
        assert!(attributed_segments("Clause 4 requires notice.", &keys).is_empty());
    }
}
