use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::types::{Finding, TemplateCatalog};

/// A report as held by the workspace. Replaced wholesale on reload.
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub report_id: String,
    pub items: Vec<Finding>,
    /// Entries that could not be read as findings.
    pub invalid_items: usize,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedReport {
    pub fn new(report_id: impl Into<String>, items: Vec<Finding>) -> Self {
        Self {
            report_id: report_id.into(),
            items,
            invalid_items: 0,
            loaded_at: Utc::now(),
        }
    }

    pub fn find(&self, item_id: &str) -> Option<&Finding> {
        self.items.iter().find(|item| item.item_id == item_id)
    }
}

#[derive(Deserialize)]
struct ReportFile {
    /// Empty until the report has been stored server-side.
    #[serde(default)]
    report_id: String,
    #[serde(alias = "cards", alias = "report_items")]
    items: Vec<serde_json::Value>,
}

/// Parse a report document; entries that are not valid findings are skipped.
pub fn parse_report(json: &str) -> Result<LoadedReport> {
    let file: ReportFile = serde_json::from_str(json).context("Failed to parse report JSON")?;
    Ok(report_from_cards(file.report_id, file.items))
}

/// Build a report from raw cards, skipping the ones that are not findings.
pub fn report_from_cards(report_id: String, cards: Vec<serde_json::Value>) -> LoadedReport {
    let mut items = Vec::with_capacity(cards.len());
    let mut invalid_items = 0;

    for (index, raw) in cards.into_iter().enumerate() {
        match serde_json::from_value::<Finding>(raw) {
            Ok(item) if !item.item_id.trim().is_empty() => items.push(item),
            Ok(_) => {
                invalid_items += 1;
                warn!(index, "report item without item_id skipped");
            }
            Err(e) => {
                invalid_items += 1;
                warn!(index, error = %e, "invalid report item skipped");
            }
        }
    }

    LoadedReport {
        invalid_items,
        ..LoadedReport::new(report_id, items)
    }
}

pub async fn load_report(path: &Path) -> Result<LoadedReport> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    let report = parse_report(&json)?;
    info!(
        report_id = %report.report_id,
        items = report.items.len(),
        invalid = report.invalid_items,
        "Report loaded"
    );
    Ok(report)
}

pub async fn load_catalog(path: &Path) -> Result<TemplateCatalog> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let catalog: TemplateCatalog =
        serde_json::from_str(&json).context("Failed to parse catalog JSON")?;
    info!(
        template_id = %catalog.template_id,
        documents = catalog.documents.len(),
        standards = catalog.standards.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}
