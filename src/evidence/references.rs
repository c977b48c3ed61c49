use serde::Serialize;

use crate::catalog::types::Finding;
use crate::catalog::DocumentLookup;

use super::normalize::{collapse_whitespace, truncate_for_display, REFERENCE_PREVIEW_CHARS};
use super::split::EvidenceSplit;

/// One selectable evidence fragment of a finding, shown in the reference list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceReference {
    /// `"<document_id>:<fragment index>"`
    pub id: String,
    pub document_id: String,
    pub label: String,
    pub preview: String,
    pub evidence_text: String,
    pub is_active: bool,
}

/// What the workspace currently has focused, used to flag the active entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSelection {
    pub document_id: Option<String>,
    pub reference_id: Option<String>,
}

impl ActiveSelection {
    /// An explicit reference id wins; otherwise the first fragment of the
    /// active document is the active one.
    fn is_active(&self, reference_id: &str, document_id: &str, fragment_index: usize) -> bool {
        match &self.reference_id {
            Some(active) => active == reference_id,
            None => self.document_id.as_deref() == Some(document_id) && fragment_index == 0,
        }
    }
}

/// Build the fragment-level reference list of a finding.
///
/// Every candidate document gets one entry per extracted fragment; a document
/// with nothing attributed to it gets a single entry carrying the whole
/// normalized narrative.
pub fn reference_items(
    finding: &Finding,
    split: &EvidenceSplit,
    lookup: &DocumentLookup,
    active: &ActiveSelection,
) -> Vec<EvidenceReference> {
    let whole_evidence = collapse_whitespace(&finding.evidence);
    let mut items = Vec::new();

    for document_id in lookup.candidate_ids(finding) {
        let fragments: Vec<String> = match split.fragments(&document_id) {
            Some(fragments) if !fragments.is_empty() => fragments.to_vec(),
            _ => vec![whole_evidence.clone()],
        };
        let document = lookup.reference_for(&document_id);
        let several = fragments.len() > 1;

        for (index, evidence_text) in fragments.into_iter().enumerate() {
            let id = format!("{}:{}", document_id, index);
            let suffix = if several {
                format!(" [{}]", index + 1)
            } else {
                String::new()
            };
            items.push(EvidenceReference {
                is_active: active.is_active(&id, &document_id, index),
                label: format!("{} ({}){}", document.file_name, document.display_name, suffix),
                preview: truncate_for_display(&evidence_text, REFERENCE_PREVIEW_CHARS),
                document_id: document_id.clone(),
                evidence_text,
                id,
            });
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{finding, sample_catalog};
    use crate::evidence::split::split_evidence;

    fn build(evidence: &str, refs: &[&str], active: &ActiveSelection) -> Vec<EvidenceReference> {
        let f = finding("C-1", evidence, refs);
        let split = split_evidence(&f.evidence, &f.document_references);
        let lookup = DocumentLookup::from_catalog(Some(&sample_catalog()));
        reference_items(&f, &split, &lookup, active)
    }

    #[test]
    fn test_reference_items_per_fragment() {
        let items = build(
            r#"From DOC-A: "one" "two" From DOC-B: "three""#,
            &["DOC-A", "DOC-B"],
            &ActiveSelection::default(),
        );
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["DOC-A:0", "DOC-A:1", "DOC-B:0"]);
        assert_eq!(items[1].label, "contract-data.pdf (Contract Data) [2]");
        assert_eq!(items[2].label, "works-info.pdf (Works Information)");
        assert!(items.iter().all(|i| !i.is_active));
    }

    #[test]
    fn test_unattributed_document_gets_whole_evidence() {
        let items = build(
            "From DOC-A: \"one\"\n  and more",
            &["DOC-A", "DOC-Z"],
            &ActiveSelection::default(),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].evidence_text, "From DOC-A: \"one\" and more");
        assert_eq!(items[1].label, "DOC-Z.pdf (DOC-Z)");
    }

    #[test]
    fn test_active_flags() {
        let evidence = r#"From DOC-A: "one" "two""#;
        let by_document = ActiveSelection {
            document_id: Some("DOC-A".to_string()),
            reference_id: None,
        };
        let items = build(evidence, &["DOC-A"], &by_document);
        assert!(items[0].is_active && !items[1].is_active);

        let by_reference = ActiveSelection {
            document_id: Some("DOC-A".to_string()),
            reference_id: Some("DOC-A:1".to_string()),
        };
        let items = build(evidence, &["DOC-A"], &by_reference);
        assert!(!items[0].is_active && items[1].is_active);
    }

    #[test]
    fn test_preview_is_truncated() {
        let long = format!("From DOC-A: {}", "word ".repeat(60));
        let items = build(&long, &["DOC-A"], &ActiveSelection::default());
        assert!(items[0].preview.ends_with("..."));
        assert!(items[0].preview.chars().count() <= REFERENCE_PREVIEW_CHARS + 3);
    }
}
