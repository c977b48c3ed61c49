use crate::catalog::types::DocumentId;

use super::markers::{attributed_segments, ReferenceKeys};
use super::normalize::collapse_whitespace;
use super::quotes::segment_fragments;

/// Fragments attributed to one document, in order of first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvidence {
    pub document_id: DocumentId,
    pub fragments: Vec<String>,
}

impl DocumentEvidence {
    /// All fragments joined into the text sent for resolution.
    pub fn evidence_text(&self) -> String {
        collapse_whitespace(&self.fragments.join(" "))
    }
}

/// Per-document evidence extracted from a finding's narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceSplit {
    documents: Vec<DocumentEvidence>,
}

impl EvidenceSplit {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[DocumentEvidence] {
        &self.documents
    }

    pub fn fragments(&self, document_id: &str) -> Option<&[String]> {
        self.get(document_id).map(|doc| doc.fragments.as_slice())
    }

    /// The document's evidence text, or `None` when nothing was attributed to it.
    pub fn evidence_text(&self, document_id: &str) -> Option<String> {
        let text = self.get(document_id)?.evidence_text();
        (!text.is_empty()).then_some(text)
    }

    fn get(&self, document_id: &str) -> Option<&DocumentEvidence> {
        self.documents.iter().find(|doc| doc.document_id == document_id)
    }

    fn push_fragments(&mut self, document_id: &str, fragments: Vec<String>) {
        let index = match self.documents.iter().position(|doc| doc.document_id == document_id) {
            Some(index) => index,
            None => {
                self.documents.push(DocumentEvidence {
                    document_id: document_id.to_string(),
                    fragments: Vec::new(),
                });
                self.documents.len() - 1
            }
        };
        let target = &mut self.documents[index].fragments;
        for fragment in fragments {
            if !target.contains(&fragment) {
                target.push(fragment);
            }
        }
    }
}

/// Split an evidence narrative into per-document fragments.
///
/// Only markers naming one of `references` count. An empty result means the
/// narrative carries no usable attribution and callers should use the whole
/// evidence for the default candidate.
pub fn split_evidence(evidence: &str, references: &[String]) -> EvidenceSplit {
    let keys = ReferenceKeys::new(references);
    let mut split = EvidenceSplit::default();
    if keys.is_empty() {
        return split;
    }

    for segment in attributed_segments(evidence, &keys) {
        let fragments = segment_fragments(segment.text);
        if fragments.is_empty() {
            continue;
        }
        split.push_fragments(&segment.document_id, fragments);
    }
    split
}
