use anyhow::Result;

use crate::catalog::DocumentLookup;
use crate::evidence::clause::{clause_keyword, estimate_page};
use crate::evidence::references::{reference_items, ActiveSelection};
use crate::evidence::split::split_evidence;
use crate::state::WorkspaceConfig;

use super::{InputArgs, Inputs};

pub async fn split(config: &WorkspaceConfig, input: &InputArgs, item_id: &str) -> Result<()> {
    let inputs = Inputs::load(input, config).await?;
    let finding = inputs.finding(item_id)?;
    let lookup = DocumentLookup::from_catalog(inputs.catalog.as_ref());
    let split = split_evidence(&finding.evidence, &finding.document_references);

    println!("Item: {}", finding.item_id);
    println!(
        "Clause hint: {}",
        clause_keyword(&finding.evidence).as_deref().unwrap_or("-")
    );
    println!("Estimated page: {}", estimate_page(&finding.evidence));

    if split.is_empty() {
        println!("\nNo document-attributed evidence; the full text is sent to every candidate.");
    }
    for document in split.documents() {
        let reference = lookup.reference_for(&document.document_id);
        println!(
            "\n{} ({}), hint {}",
            reference.file_name,
            reference.display_name,
            clause_keyword(&document.evidence_text()).as_deref().unwrap_or("-")
        );
        for (i, fragment) in document.fragments.iter().enumerate() {
            println!("  {}. {}", i + 1, fragment);
        }
    }

    let references = reference_items(finding, &split, &lookup, &ActiveSelection::default());
    println!("\nReferences:");
    for reference in references {
        println!("  [{}] {}: {}", reference.id, reference.label, reference.preview);
    }

    Ok(())
}
