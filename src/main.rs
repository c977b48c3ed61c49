mod anchor_client;
mod catalog;
mod commands;
mod error;
mod evidence;
mod resolve;
mod state;
mod workspace;

use clap::Parser;
use tracing::debug;

use commands::Cli;
use state::WorkspaceConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load env
    let _ = dotenv::dotenv();
    let config = WorkspaceConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .init();
    debug!(?config, "configuration loaded");

    let cli = Cli::parse();
    commands::run(cli, &config).await
}
