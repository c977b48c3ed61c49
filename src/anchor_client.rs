use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::load::{report_from_cards, LoadedReport};
use crate::catalog::types::{
    ApiEnvelope, ExportRequest, IngestReportRequest, IngestReportResult, ReportCards,
    ResolveRequest, ResolveResponse, TemplateCatalog,
};
use crate::catalog::FALLBACK_DOCUMENT_ID;
use crate::error::{ApiError, ResolveError};
use crate::resolve::AnchorService;
use crate::state::WorkspaceConfig;
use crate::workspace::viewer::{DocumentSource, OpenedDocument};

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename="?([^";]+)"?"#).expect("valid content-disposition regex")
});

/// A rendered report export.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// HTTP client for the tender API: template, reports, evidence resolution,
/// document files and exports.
pub struct AnchorClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnchorClient {
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v1/evidence/resolve", self.base_url.trim_end_matches('/'))
    }

    /// `{base}/api/v1/<segments>`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Option<Url> {
        let mut url = Url::parse(self.base_url.trim_end_matches('/')).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Some(url)
    }

    fn required_url(&self, segments: &[&str]) -> Result<Url> {
        self.api_url(segments)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))
    }

    fn file_url(&self, document_id: &str) -> Option<Url> {
        if document_id.is_empty() || document_id == FALLBACK_DOCUMENT_ID {
            return None;
        }
        self.api_url(&["documents", document_id, "file"])
    }

    /// Link to a document's file opened at `page`. `None` for the placeholder
    /// document or an unusable base URL.
    pub fn document_url(&self, document_id: &str, page: u32) -> Option<String> {
        let mut url = self.file_url(document_id)?;
        url.set_fragment(Some(&format!("page={}", page)));
        Some(url.to_string())
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let resp = request.send().await?;
        let status = resp.status();
        let url = resp.url().path().to_string();
        let text = resp.text().await?;
        debug!(%url, status = status.as_u16(), body_len = text.len(), "tender API replied");
        parse_envelope(status, &text)
    }

    /// The standards and source documents of the NEC template.
    pub async fn fetch_template(&self) -> Result<TemplateCatalog> {
        let url = self.required_url(&["templates", "nec"])?;
        let catalog: TemplateCatalog = self
            .call(self.client.get(url))
            .await
            .context("Failed to fetch template")?;
        info!(
            template_id = %catalog.template_id,
            documents = catalog.documents.len(),
            "Template fetched"
        );
        Ok(catalog)
    }

    pub async fn ingest_report(&self, request: &IngestReportRequest) -> Result<IngestReportResult> {
        let url = self.required_url(&["reports", "ingest"])?;
        let result: IngestReportResult = self
            .call(self.client.post(url).json(request))
            .await
            .context("Failed to ingest report")?;
        info!(
            report_id = %result.report_id,
            items = result.items_count,
            invalid = result.invalid_items.len(),
            source = %request.report_source,
            "Report ingested"
        );
        Ok(result)
    }

    pub async fn fetch_report_cards(&self, report_id: &str) -> Result<LoadedReport> {
        let url = self.required_url(&["reports", report_id, "cards"])?;
        let cards: ReportCards = self
            .call(self.client.get(url))
            .await
            .with_context(|| format!("Failed to fetch cards of report {}", report_id))?;
        Ok(report_from_cards(cards.report_id, cards.cards))
    }

    /// Render a report export. The file name comes from `Content-Disposition`
    /// when the server sends one.
    pub async fn export_report(&self, request: &ExportRequest) -> Result<ExportedFile> {
        let url = self.required_url(&["exports", "report"])?;
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .context("Failed to request export")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!(failure_message(&body, "Export failed", status));
        }

        let disposition = resp
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = resp.bytes().await.context("Failed to read export")?.to_vec();
        let file_name = export_file_name(&disposition).unwrap_or_else(|| {
            format!(
                "tender-analysis-{}.{}",
                Utc::now().timestamp_millis(),
                request.format.extension()
            )
        });
        info!(report_id = %request.report_id, %file_name, size = bytes.len(), "Report exported");
        Ok(ExportedFile { file_name, bytes })
    }
}

#[async_trait]
impl AnchorService for AnchorClient {
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolveResponse, ResolveError> {
        self.call(self.client.post(self.endpoint()).json(request))
            .await
            .map_err(|e| ResolveError::from_api(&request.document_id, e))
    }
}

#[async_trait]
impl DocumentSource for AnchorClient {
    async fn open(&self, document_id: &str) -> Result<OpenedDocument> {
        let url = self
            .file_url(document_id)
            .with_context(|| format!("No file URL for document {}", document_id))?;
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to request document file")?
            .error_for_status()
            .context("Document file request rejected")?
            .bytes()
            .await
            .context("Failed to read document file")?;

        let page_count = count_pdf_pages(&bytes);
        debug!(document_id, size = bytes.len(), page_count, "document file fetched");
        Ok(OpenedDocument {
            document_id: document_id.to_string(),
            page_count,
        })
    }

    async fn release(&self, document: OpenedDocument) {
        debug!(document_id = %document.document_id, "document released");
    }
}

static PDF_PAGE_RE: LazyLock<BytesRegex> =
    LazyLock::new(|| BytesRegex::new(r"/Type\s*/Page\b").expect("valid pdf page regex"));

/// Page objects in an uncompressed PDF body. 0 when none are visible, which
/// the viewer treats as an unknown count.
fn count_pdf_pages(bytes: &[u8]) -> u32 {
    u32::try_from(PDF_PAGE_RE.find_iter(bytes).count()).unwrap_or(u32::MAX)
}

fn export_file_name(disposition: &str) -> Option<String> {
    FILENAME_RE
        .captures(disposition)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

/// The server's `message` for a failed call, else `"<prefix>: <status>"`.
fn failure_message(body: &str, prefix: &str, status: StatusCode) -> String {
    serde_json::from_str::<ApiMessage>(body)
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("{}: {}", prefix, status.as_u16()))
}

/// Unwrap the `{code, message, request_id, data}` envelope.
fn parse_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Rejected(failure_message(body, "Request failed", status)));
    }

    let envelope: ApiEnvelope<T> = serde_json::from_str(body)?;
    debug!(request_id = %envelope.request_id, code = %envelope.code, "envelope decoded");
    if envelope.code != "OK" {
        let message = if envelope.message.is_empty() {
            "Unexpected API response".to_string()
        } else {
            envelope.message
        };
        return Err(ApiError::Rejected(message));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::Rejected("Unexpected API response".to_string()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> AnchorClient {
        AnchorClient::from_config(&WorkspaceConfig {
            api_base_url: base.to_string(),
            http_timeout: Duration::from_secs(5),
            log_level: tracing::Level::INFO,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            client("http://localhost:8000/").endpoint(),
            "http://localhost:8000/api/v1/evidence/resolve"
        );
    }

    #[test]
    fn test_document_url() {
        let c = client("http://localhost:8000");
        assert_eq!(
            c.document_url("nec a/1", 7).as_deref(),
            Some("http://localhost:8000/api/v1/documents/nec%20a%2F1/file#page=7")
        );
        assert!(c.document_url("unknown", 1).is_none());
    }

    #[test]
    fn test_count_pdf_pages() {
        let body = b"1 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] >>\n\
            2 0 obj << /Type /Page >>\n3 0 obj <</Type/Page/Parent 1 0 R>>";
        assert_eq!(count_pdf_pages(body), 2);
        assert_eq!(count_pdf_pages(b"%PDF-1.7 compressed"), 0);
    }

    #[tokio::test]
    async fn test_open_placeholder_document_fails() {
        let c = client("http://localhost:8000");
        assert!(c.open("unknown").await.is_err());
    }

    #[test]
    fn test_api_urls() {
        let c = client("http://localhost:8000/");
        assert_eq!(
            c.api_url(&["reports", "rep 1", "cards"]).unwrap().as_str(),
            "http://localhost:8000/api/v1/reports/rep%201/cards"
        );
        assert!(client("not a url").api_url(&["templates", "nec"]).is_none());
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(r#"attachment; filename="tender-report.docx""#).as_deref(),
            Some("tender-report.docx")
        );
        assert_eq!(
            export_file_name("attachment; FILENAME=out.pdf; size=10").as_deref(),
            Some("out.pdf")
        );
        assert!(export_file_name("inline").is_none());
    }

    #[test]
    fn test_parse_ok_envelope() {
        let body = r#"{"code": "OK", "message": "success", "request_id": "req-1", "data": {
            "item_id": "C-1", "document_id": "DOC-A", "file_name": "a.pdf", "anchors": []
        }}"#;
        let resp: ResolveResponse = parse_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(resp.file_name, "a.pdf");
        assert!(resp.anchors.is_empty());

        let cards: ReportCards = parse_envelope(
            StatusCode::OK,
            r#"{"code": "OK", "data": {"report_id": "rep_3", "cards": [{"item_id": "C-1"}]}}"#,
        )
        .unwrap();
        assert_eq!(cards.report_id, "rep_3");
        assert_eq!(cards.cards.len(), 1);
    }

    #[test]
    fn test_parse_error_envelope() {
        let body = r#"{"code": "NOT_FOUND", "message": "document missing", "request_id": "req-2"}"#;
        let err = parse_envelope::<ResolveResponse>(StatusCode::NOT_FOUND, body).unwrap_err();
        let err = ResolveError::from_api("DOC-A", err);
        assert_eq!(
            err.to_string(),
            "Evidence resolve for DOC-A rejected: document missing"
        );

        let err = parse_envelope::<ResolveResponse>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert_eq!(err.to_string(), "Request failed: 502");

        let err = parse_envelope::<ResolveResponse>(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(
            ResolveError::from_api("DOC-A", err),
            ResolveError::Decode { .. }
        ));

        let err = parse_envelope::<ResolveResponse>(
            StatusCode::OK,
            r#"{"code": "BUSY", "request_id": "req-3"}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Unexpected API response");
    }
}
