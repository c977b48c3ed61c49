use anyhow::Result;

use crate::catalog::{selected_standards, visible_findings};
use crate::evidence::normalize::truncate_for_display;
use crate::state::WorkspaceConfig;

use super::{InputArgs, Inputs};

const DESCRIPTION_PREVIEW_CHARS: usize = 80;

pub async fn cards(
    config: &WorkspaceConfig,
    input: &InputArgs,
    search: &str,
    standards: Vec<String>,
) -> Result<()> {
    let inputs = Inputs::load(input, config).await?;
    let selection = inputs.standard_selection(standards);

    if let Some(catalog) = &inputs.catalog {
        let selected = selected_standards(catalog, &selection);
        if !selected.is_empty() {
            let names: Vec<String> = selected
                .iter()
                .map(|s| format!("{}. {}", s.priority, s.name))
                .collect();
            println!("Standards: {}", names.join(", "));
        }
    }

    let visible = visible_findings(
        &inputs.report.items,
        inputs.catalog.as_ref(),
        &selection,
        search,
    );
    println!(
        "Report {} (loaded {}): {} of {} findings",
        inputs.report.report_id,
        inputs.report.loaded_at.format("%Y-%m-%d %H:%M:%S"),
        visible.len(),
        inputs.report.items.len()
    );
    for item in visible {
        println!(
            "  {} [{:?}/{:?}] {} {}",
            item.item_id,
            item.severity,
            item.consistency_status,
            item.check_type,
            truncate_for_display(&item.description, DESCRIPTION_PREVIEW_CHARS)
        );
    }

    Ok(())
}
