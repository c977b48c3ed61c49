pub mod load;
pub mod types;

use std::collections::HashMap;

use types::{DocumentId, DocumentReference, Finding, SelectedStandard, StandardDefinition, TemplateCatalog};

/// Id of the placeholder document used when the catalog lists none.
pub const FALLBACK_DOCUMENT_ID: &str = "unknown";

pub fn fallback_document() -> DocumentReference {
    DocumentReference {
        document_id: FALLBACK_DOCUMENT_ID.to_string(),
        file_name: "unknown.pdf".to_string(),
        display_name: "Unknown Document".to_string(),
    }
}

/// Map a raw document id to full metadata: the catalog entry if known, the
/// default document if the id is the default's, else a synthetic
/// `<id>.pdf` reference.
pub fn map_document_reference(
    document_id: &str,
    table: &HashMap<DocumentId, DocumentReference>,
    default_document: &DocumentReference,
) -> DocumentReference {
    if let Some(known) = table.get(document_id) {
        return known.clone();
    }
    if document_id == default_document.document_id {
        return default_document.clone();
    }
    DocumentReference::synthetic(document_id)
}

/// Document lookup table, rebuilt wholesale from the catalog and never
/// mutated in place.
#[derive(Debug, Clone)]
pub struct DocumentLookup {
    by_id: HashMap<DocumentId, DocumentReference>,
    default_document: DocumentReference,
}

impl Default for DocumentLookup {
    fn default() -> Self {
        Self::from_catalog(None)
    }
}

impl DocumentLookup {
    pub fn from_catalog(catalog: Option<&TemplateCatalog>) -> Self {
        let documents = catalog.map(|c| c.documents.as_slice()).unwrap_or_default();
        let default_document = documents.first().cloned().unwrap_or_else(fallback_document);
        let by_id = documents
            .iter()
            .map(|doc| (doc.document_id.clone(), doc.clone()))
            .collect();
        Self {
            by_id,
            default_document,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn reference_for(&self, document_id: &str) -> DocumentReference {
        map_document_reference(document_id, &self.by_id, &self.default_document)
    }

    /// Candidate documents of a finding: trimmed, de-duplicated references in
    /// first-seen order, or the default document when it cites none.
    pub fn candidate_ids(&self, finding: &Finding) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> = Vec::new();
        for reference in &finding.document_references {
            let id = reference.trim();
            if !id.is_empty() && !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        if ids.is_empty() {
            ids.push(self.default_document.document_id.clone());
        }
        ids
    }
}

/// Standards enabled by default, ordered by their default priority.
pub fn default_standard_selection(catalog: &TemplateCatalog) -> Vec<String> {
    let mut enabled: Vec<&StandardDefinition> =
        catalog.standards.iter().filter(|s| s.enabled_by_default).collect();
    enabled.sort_by_key(|s| s.default_priority);
    enabled.into_iter().map(|s| s.standard_id.clone()).collect()
}

/// Selected standards with 1-based priority in selection order. Ids missing
/// from the catalog keep their id as name.
pub fn selected_standards(catalog: &TemplateCatalog, selection: &[String]) -> Vec<SelectedStandard> {
    selection
        .iter()
        .enumerate()
        .map(|(index, standard_id)| {
            let name = catalog
                .standards
                .iter()
                .find(|s| &s.standard_id == standard_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| standard_id.clone());
            SelectedStandard {
                standard_id: standard_id.clone(),
                name,
                priority: index + 1,
            }
        })
        .collect()
}

/// Findings visible under a standards selection and a free-text search.
///
/// The check-type filter applies only when the selection contributes at
/// least one check type.
pub fn visible_findings<'a>(
    findings: &'a [Finding],
    catalog: Option<&TemplateCatalog>,
    selection: &[String],
    search: &str,
) -> Vec<&'a Finding> {
    let check_types: Vec<&str> = catalog
        .map(|c| {
            selection
                .iter()
                .filter_map(|id| c.standards.iter().find(|s| &s.standard_id == id))
                .flat_map(|s| s.check_types.iter())
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();
    let keyword = search.trim().to_lowercase();

    findings
        .iter()
        .filter(|item| {
            if !selection.is_empty()
                && !check_types.is_empty()
                && !check_types.contains(&item.check_type.as_str())
            {
                return false;
            }
            if keyword.is_empty() {
                return true;
            }
            [
                item.item_id.as_str(),
                item.description.as_str(),
                item.reasoning.as_str(),
                item.evidence.as_str(),
                item.check_type.as_str(),
            ]
            .join(" ")
            .to_lowercase()
            .contains(&keyword)
        })
        .collect()
}
