use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{FileDocumentSink, HttpFormService, WizardController};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::{load_settings, DEFAULT_CONFIG_PATH};
use session::Session;

#[derive(Parser, Debug)]
#[command(name = "form-wizard", version, about = "Fill in the PC-1 form step by step")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Base address of the form service.
    #[arg(long)]
    api_url: Option<String>,
    /// Directory the downloaded document is written to.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    #[arg(long)]
    document_file_name: Option<String>,
    /// Used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_filter: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Walk through the form interactively (default).
    Run,
    GenerateJson,
    GenerateDocument,
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(&cli.config)?;
    settings.apply_overrides(cli.api_url, cli.output_dir, cli.document_file_name);
    info!(api_url = %settings.api_url, output_dir = %settings.output_dir.display(), "starting form wizard");

    let service = HttpFormService::new(&settings.api_url)
        .with_context(|| format!("invalid api url '{}'", settings.api_url))?;
    let sink = FileDocumentSink::new(settings.output_dir, settings.document_file_name);
    let controller = WizardController::new_with_sink(Arc::new(service), Arc::new(sink));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let input = BufReader::new(tokio::io::stdin());
            Session::new(controller, input, tokio::io::stdout())
                .run()
                .await?;
        }
        Command::GenerateJson => {
            let outcome = controller.generate_artifact().await;
            report(&controller, outcome).await?;
        }
        Command::GenerateDocument => {
            let outcome = controller.generate_document().await;
            if let Ok(delivered) = &outcome {
                println!("Saved to {}", delivered.path.display());
            }
            report(&controller, outcome).await?;
        }
        Command::Restart => {
            let outcome = controller.restart().await;
            if let Ok(phase) = &outcome {
                println!("Form restarted ({phase})");
            }
            report(&controller, outcome).await?;
        }
    }

    Ok(())
}

async fn report<T>(
    controller: &WizardController,
    outcome: std::result::Result<T, client_core::WorkflowError>,
) -> Result<()> {
    let status = controller.snapshot().await.status;
    if !status.is_empty() {
        println!("{status}");
    }
    outcome.map(|_| ()).context("form service operation failed")
}
