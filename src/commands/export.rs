use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::anchor_client::AnchorClient;
use crate::catalog::types::{ExportFormat, ExportRequest};
use crate::catalog::{selected_standards, visible_findings};
use crate::state::WorkspaceConfig;

use super::{InputArgs, Inputs};

pub async fn export(
    config: &WorkspaceConfig,
    input: &InputArgs,
    search: &str,
    standards: Vec<String>,
    format: ExportFormat,
    out: &Path,
) -> Result<()> {
    let inputs = Inputs::load(input, config).await?;
    if inputs.report.report_id.is_empty() {
        bail!("Report is not ready yet.");
    }

    let selection = inputs.standard_selection(standards);
    let card_ids: Vec<String> = visible_findings(
        &inputs.report.items,
        inputs.catalog.as_ref(),
        &selection,
        search,
    )
    .into_iter()
    .map(|item| item.item_id.clone())
    .collect();
    let request = ExportRequest {
        report_id: inputs.report.report_id.clone(),
        format,
        selected_standards: inputs
            .catalog
            .as_ref()
            .map(|catalog| selected_standards(catalog, &selection))
            .unwrap_or_default(),
        card_ids,
    };

    let client = AnchorClient::from_config(config)?;
    let exported = client.export_report(&request).await?;

    // Never let the server's file name escape the output directory.
    let file_name = Path::new(&exported.file_name)
        .file_name()
        .context("Export has no usable file name")?;
    let path = out.join(file_name);
    tokio::fs::write(&path, &exported.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!(
        "Exported {} findings to {}",
        request.card_ids.len(),
        path.display()
    );

    Ok(())
}
