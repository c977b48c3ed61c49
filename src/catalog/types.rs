use serde::{Deserialize, Serialize};

/// Document identifier as written in the template catalog and in findings.
/// Case-sensitive.
pub type DocumentId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Major,
    Minor,
    #[default]
    Info,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyStatus {
    Consistent,
    Inconsistent,
    #[default]
    Unknown,
}

/// A single AI-generated compliance finding ("report item").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub item_id: String,
    /// Free-text narrative, may attribute quotes with `From DOC-A: "..."`.
    #[serde(default)]
    pub evidence: String,
    /// Raw document ids, order-preserving, may contain duplicates.
    #[serde(default)]
    pub document_references: Vec<String>,
    #[serde(default)]
    pub check_type: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub consistency_status: ConsistencyStatus,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub document_id: DocumentId,
    pub file_name: String,
    pub display_name: String,
}

impl DocumentReference {
    /// Reference invented for an id the catalog does not know.
    pub fn synthetic(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            file_name: format!("{}.pdf", document_id),
            display_name: document_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDefinition {
    pub standard_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_priority: u32,
    #[serde(default)]
    pub enabled_by_default: bool,
    #[serde(default)]
    pub check_types: Vec<String>,
}

/// A standard as selected by the user, with its 1-based priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedStandard {
    pub standard_id: String,
    pub name: String,
    pub priority: usize,
}

/// Template/config catalog: the standards and the source documents of a tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    pub template_id: String,
    pub name: String,
    #[serde(default)]
    pub standards: Vec<StandardDefinition>,
    #[serde(default)]
    pub documents: Vec<DocumentReference>,
}

/// Bounding box in page points, origin at the page's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default = "default_origin")]
    pub origin: String,
}

fn default_unit() -> String {
    "pt".to_string()
}

fn default_origin() -> String {
    "top-left".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    ResolvedExact,
    ResolvedApproximate,
    Unresolved,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Fuzzy,
    Manual,
    #[serde(other)]
    Other,
}

/// One anchor candidate as returned by the resolution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAnchor {
    pub anchor_id: String,
    pub document_id: DocumentId,
    pub page: u32,
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(default)]
    pub bboxes: Option<Vec<BBox>>,
    pub match_method: MatchMethod,
    pub match_score: f64,
    pub status: MatchStatus,
}

impl EvidenceAnchor {
    /// Geometric regions to highlight. A non-empty `bboxes` supersedes `bbox`.
    pub fn regions(&self) -> Vec<BBox> {
        match (&self.bboxes, &self.bbox) {
            (Some(boxes), _) if !boxes.is_empty() => boxes.clone(),
            (_, Some(single)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    pub fn region_count(&self) -> usize {
        match (&self.bboxes, &self.bbox) {
            (Some(boxes), _) if !boxes.is_empty() => boxes.len(),
            (_, Some(_)) => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolveHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_keyword: Option<String>,
}

/// Body of `POST /api/v1/evidence/resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub report_id: String,
    pub item_id: String,
    pub document_id: DocumentId,
    pub evidence_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints: Option<ResolveHints>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub item_id: String,
    pub document_id: DocumentId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub anchors: Vec<EvidenceAnchor>,
}

/// Response wrapper used by every endpoint of the tender API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
    pub data: Option<T>,
}

/// Body of `POST /api/v1/reports/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReportRequest {
    pub report_source: String,
    pub report_items: Vec<Finding>,
}

impl IngestReportRequest {
    /// Ask the server to seed a report from its own reference data.
    pub fn reference_seed() -> Self {
        Self {
            report_source: "reference_seed".to_string(),
            report_items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestReportResult {
    pub report_id: String,
    #[serde(default)]
    pub items_count: usize,
    #[serde(default)]
    pub invalid_items: Vec<serde_json::Value>,
}

/// Data of `GET /api/v1/reports/{id}/cards`. Cards stay raw so one bad card
/// does not sink the whole report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportCards {
    pub report_id: String,
    #[serde(default)]
    pub cards: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Docx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Body of `POST /api/v1/exports/report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRequest {
    pub report_id: String,
    pub format: ExportFormat,
    pub selected_standards: Vec<SelectedStandard>,
    pub card_ids: Vec<String>,
}
