mod cards;
mod export;
mod focus;
mod split;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::anchor_client::AnchorClient;
use crate::catalog::default_standard_selection;
use crate::catalog::load::{load_catalog, load_report, LoadedReport};
use crate::catalog::types::{ExportFormat, Finding, IngestReportRequest, TemplateCatalog};
use crate::state::WorkspaceConfig;

#[derive(Parser)]
#[command(name = "evidence-pinpoint")]
#[command(author, version, about = "Locate a finding's evidence inside its source documents")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Where the report and the template catalog come from.
#[derive(Args)]
struct InputArgs {
    /// Report JSON file; with --remote it is ingested before use
    #[arg(short, long, required_unless_present = "remote")]
    report: Option<PathBuf>,
    /// Template catalog JSON file; with --remote defaults to the server's template
    #[arg(short, long)]
    catalog: Option<PathBuf>,
    /// Bootstrap template and report cards from the tender API
    #[arg(long)]
    remote: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a finding's evidence splits across its documents.
    Split {
        #[command(flatten)]
        input: InputArgs,
        /// Finding to inspect
        #[arg(short, long)]
        item: String,
    },

    /// Resolve one finding against the anchor service and print the outcome.
    Focus {
        #[command(flatten)]
        input: InputArgs,
        /// Finding to focus
        #[arg(short, long)]
        item: String,
        /// Switch to this document after the initial round
        #[arg(short, long)]
        document: Option<String>,
        /// Focus through a reference list entry (`<document>:<index>`)
        #[arg(long, conflicts_with = "document")]
        reference: Option<String>,
        /// Fetch the document file and clamp the page to its page count
        #[arg(long)]
        open: bool,
    },

    /// List findings visible under a standards selection.
    Cards {
        #[command(flatten)]
        input: InputArgs,
        /// Free-text filter
        #[arg(short, long, default_value = "")]
        search: String,
        /// Selected standard, repeatable (default: the catalog's defaults)
        #[arg(long = "standard")]
        standards: Vec<String>,
    },

    /// Export the visible findings through the tender API.
    Export {
        #[command(flatten)]
        input: InputArgs,
        /// Free-text filter
        #[arg(short, long, default_value = "")]
        search: String,
        /// Selected standard, repeatable (default: the catalog's defaults)
        #[arg(long = "standard")]
        standards: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Docx)]
        format: ExportFormat,
        /// Directory the export is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

pub async fn run(cli: Cli, config: &WorkspaceConfig) -> Result<()> {
    match cli.command {
        Command::Split { input, item } => split::split(config, &input, &item).await,
        Command::Focus {
            input,
            item,
            document,
            reference,
            open,
        } => focus::focus(config, &input, &item, document, reference, open).await,
        Command::Cards {
            input,
            search,
            standards,
        } => cards::cards(config, &input, &search, standards).await,
        Command::Export {
            input,
            search,
            standards,
            format,
            out,
        } => export::export(config, &input, &search, standards, format, &out).await,
    }
}

/// Report plus optional catalog, as every command needs them.
struct Inputs {
    report: LoadedReport,
    catalog: Option<TemplateCatalog>,
}

impl Inputs {
    async fn load(args: &InputArgs, config: &WorkspaceConfig) -> Result<Self> {
        if args.remote {
            let client = AnchorClient::from_config(config)?;
            return Self::bootstrap(&client, args).await;
        }

        let path = args
            .report
            .as_deref()
            .ok_or_else(|| anyhow!("--report is required without --remote"))?;
        let report = load_report(path).await?;
        let catalog = match &args.catalog {
            Some(path) => Some(load_catalog(path).await?),
            None => None,
        };
        Ok(Self { report, catalog })
    }

    /// Template from the server (unless a catalog file is given), then the
    /// report ingested server-side and read back as cards.
    async fn bootstrap(client: &AnchorClient, args: &InputArgs) -> Result<Self> {
        let catalog = match &args.catalog {
            Some(path) => load_catalog(path).await?,
            None => client.fetch_template().await?,
        };
        let request = match &args.report {
            Some(path) => IngestReportRequest {
                report_source: "cli_upload".to_string(),
                report_items: load_report(path).await?.items,
            },
            None => IngestReportRequest::reference_seed(),
        };
        let ingested = client.ingest_report(&request).await?;
        let report = client.fetch_report_cards(&ingested.report_id).await?;
        info!(
            report_id = %report.report_id,
            cards = report.items.len(),
            "workspace bootstrapped"
        );
        Ok(Self {
            report,
            catalog: Some(catalog),
        })
    }

    fn finding(&self, item_id: &str) -> Result<&Finding> {
        self.report.find(item_id).ok_or_else(|| {
            anyhow!(
                "Item {} not found in report {}",
                item_id,
                self.report.report_id
            )
        })
    }

    /// The explicit standards, else the catalog's defaults.
    fn standard_selection(&self, standards: Vec<String>) -> Vec<String> {
        match &self.catalog {
            Some(catalog) if standards.is_empty() => default_standard_selection(catalog),
            _ => standards,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_required_without_remote() {
        assert!(Cli::try_parse_from(["evidence-pinpoint", "cards"]).is_err());
        assert!(Cli::try_parse_from(["evidence-pinpoint", "cards", "--remote"]).is_ok());
        assert!(Cli::try_parse_from(["evidence-pinpoint", "cards", "-r", "report.json"]).is_ok());
    }

    #[test]
    fn test_export_arguments() {
        let cli = Cli::try_parse_from([
            "evidence-pinpoint",
            "export",
            "--remote",
            "--format",
            "pdf",
            "--standard",
            "S1",
            "--standard",
            "S2",
        ])
        .unwrap();
        match cli.command {
            Command::Export {
                input,
                format,
                standards,
                out,
                ..
            } => {
                assert!(input.remote);
                assert!(input.report.is_none());
                assert_eq!(format, ExportFormat::Pdf);
                assert_eq!(standards, vec!["S1", "S2"]);
                assert_eq!(out, PathBuf::from("."));
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_focus_document_conflicts_with_reference() {
        let args = [
            "evidence-pinpoint",
            "focus",
            "-r",
            "report.json",
            "-i",
            "C-1",
            "--document",
            "DOC-A",
            "--reference",
            "DOC-A:0",
        ];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[tokio::test]
    async fn test_local_inputs_need_report() {
        let args = InputArgs {
            report: None,
            catalog: None,
            remote: false,
        };
        let err = Inputs::load(&args, &WorkspaceConfig::default()).await.err().unwrap();
        assert!(err.to_string().contains("--report"));
    }
}
