use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::anchor_client::AnchorClient;
use crate::state::WorkspaceConfig;
use crate::workspace::viewer::{DocumentViewer, LoadOutcome};
use crate::workspace::WorkspaceSession;

use super::{InputArgs, Inputs};

pub async fn focus(
    config: &WorkspaceConfig,
    input: &InputArgs,
    item_id: &str,
    document: Option<String>,
    reference: Option<String>,
    open: bool,
) -> Result<()> {
    let Inputs { report, catalog } = Inputs::load(input, config).await?;
    let client = Arc::new(AnchorClient::from_config(config)?);
    info!(base_url = %config.api_base_url, "anchor client ready");

    let session = WorkspaceSession::new(client.clone());
    session.set_catalog(catalog.as_ref()).await;

    match reference {
        Some(reference_id) => {
            session.replace_report(report).await;
            let references = session.references(item_id).await?;
            let reference = references
                .iter()
                .find(|r| r.id == reference_id)
                .ok_or_else(|| {
                    let known: Vec<&str> = references.iter().map(|r| r.id.as_str()).collect();
                    anyhow!(
                        "Unknown reference {}. Valid: {}",
                        reference_id,
                        known.join(", ")
                    )
                })?;
            session.select_reference(item_id, reference).await?;
        }
        None => {
            session.load_report(report, Some(item_id)).await?;
            if let Some(document_id) = document {
                session.switch_document(&document_id).await?;
            }
        }
    }

    let outcome = session.outcome().await;
    if let Some(error) = &outcome.error {
        warn!(item_id, %error, "showing estimated page");
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
    );

    let mut page = outcome.page;
    if open {
        let viewer = DocumentViewer::new(client.clone());
        match viewer.load(&outcome.document_id).await {
            LoadOutcome::Loaded(document) if document.page_count > 0 => {
                page = viewer.state().await.display_page(outcome.page);
                println!("Page {} of {}", page, document.page_count);
            }
            LoadOutcome::Loaded(_) => println!("Page {} (page count unknown)", page),
            LoadOutcome::Cleared => println!("No document to open"),
            LoadOutcome::Failed(message) => println!("{}", message),
            LoadOutcome::Superseded => {}
        }
    }
    if let Some(link) = client.document_url(&outcome.document_id, page) {
        println!("{}", link);
    }

    let documents = session.documents().await;
    if documents.len() > 1 {
        println!("Other documents:");
        for document in documents.iter().filter(|d| d.document_id != outcome.document_id) {
            println!("  {} ({})", document.document_id, document.display_name);
        }
    }

    Ok(())
}
