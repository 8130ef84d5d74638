//! Workbook tool server speaking MCP over stdio.

mod error;
mod service;
mod workbook;

use clap::Parser;
use mcp::JsonRpcRequest;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use error::Result;
use service::SheetService;
use workbook::WorkbookStore;

#[derive(Parser)]
#[command(name = "sheetd")]
#[command(about = "Workbook tool server speaking MCP over stdio", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the workbook files
    #[arg(long, default_value = "workbooks")]
    data_dir: std::path::PathBuf,

    /// Write a small demo workbook into an empty data directory
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logging goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "sheetd=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    std::fs::create_dir_all(&cli.data_dir)?;

    let store = WorkbookStore::new(&cli.data_dir);
    if cli.seed_demo && store.list_files()?.is_empty() {
        store.save("accounts.json", &workbook::demo_workbook())?;
        info!("seeded demo workbook accounts.json");
    }

    let service = SheetService::new(store);
    info!(data_dir = %cli.data_dir.display(), "sheetd ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "skipping unparseable message");
                continue;
            }
        };

        if let Some(response) = service.handle(request) {
            let json = serde_json::to_string(&response).map_err(std::io::Error::other)?;
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
