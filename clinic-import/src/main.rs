//! clinic-import command line
//!
//! ```text
//! clinic-import submit rows.json --semester "Fall 2025" --url http://127.0.0.1:5740
//! clinic-import preview rows.json
//! clinic-import audit --url http://127.0.0.1:5740
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clinic_common::config::ENV_SERVICE_KEY;
use clinic_import::{load_rows, preview, ImportClient};
use tracing::{info, warn};

/// Portal base URL environment variable
const ENV_PORTAL_URL: &str = "CLINIC_PORTAL_URL";

#[derive(Parser, Debug)]
#[command(name = "clinic-import")]
#[command(about = "Load debrief exports into the clinic portal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct PortalArgs {
    /// Portal base URL
    #[arg(long, env = ENV_PORTAL_URL, default_value = "http://127.0.0.1:5740")]
    url: String,

    /// Service key sent as x-api-key
    #[arg(long, env = ENV_SERVICE_KEY)]
    api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate rows and store them in the portal
    Submit {
        /// JSON file holding an array of debrief rows
        file: PathBuf,

        /// Semester the summaries are filed under
        #[arg(long)]
        semester: Option<String>,

        #[command(flatten)]
        portal: PortalArgs,
    },

    /// Show the weekly summaries a file would produce, without submitting
    Preview {
        /// JSON file holding an array of debrief rows
        file: PathBuf,
    },

    /// Print distinct clinics, clients and weeks already stored
    Audit {
        #[command(flatten)]
        portal: PortalArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Submit {
            file,
            semester,
            portal,
        } => {
            let rows = load_rows(&file)?;
            info!("Submitting {} rows from {}", rows.len(), file.display());

            let client = ImportClient::new(&portal.url, portal.api_key)?;
            let report = client
                .submit(&rows, semester.as_deref())
                .await
                .context("Import failed")?;

            for error in &report.results.errors {
                warn!("{}", error);
            }
            info!("{}", report.message);
            println!("{}", report.message);
        }
        Command::Preview { file } => {
            let rows = load_rows(&file)?;
            let preview = preview(&rows);
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Command::Audit { portal } => {
            let client = ImportClient::new(&portal.url, portal.api_key)?;
            let report = client.audit().await.context("Audit failed")?;

            println!("Total summaries: {}", report.total_records);
            println!("Clinics ({}): {}", report.audit.clinic_count, report.audit.unique_clinics.join(", "));
            println!("Clients ({}): {}", report.audit.client_count, report.audit.unique_clients.join(", "));
            println!("Weeks ({}): {}", report.audit.week_count, report.audit.unique_weeks.join(", "));
        }
    }

    Ok(())
}
