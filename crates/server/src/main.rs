//! Purser — a spreadsheet chat agent over MCP tools.

mod config;
mod context;
mod error;
mod routes;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use agent::{ChatAgent, GeminiBackend, ProviderSet};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
use context::ContextBuilder;
use error::Result;
use routes::AppState;

/// Alias of the provider used to resolve @mentions.
const SHEETS_ALIAS: &str = "sheets";

#[derive(Parser)]
#[command(name = "purser")]
#[command(about = "Spreadsheet chat agent over MCP tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "purser.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "purser=info,server=info,agent=info,mcp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let backend = GeminiBackend::new(config.api_key()?).with_model(&config.model.model);
    info!(model = backend.model(), "model backend ready");

    // A provider that fails to connect stays registered; its listings fail
    // and the catalog skips it each round.
    let mut clients = Vec::new();
    let mut providers = ProviderSet::new();
    for tool_config in &config.tool_servers {
        let client = Arc::new(mcp::Client::new(tool_config.clone().into()));
        match client.connect().await {
            Ok(()) => {
                if let Some(server) = client.server_info().await {
                    info!(
                        provider = %tool_config.name,
                        server = %server.name,
                        version = %server.version,
                        "tool server connected"
                    );
                }
            }
            Err(e) => {
                warn!(provider = %tool_config.name, error = %e, "failed to connect tool server");
            }
        }
        providers = providers.register(&tool_config.name, client.clone());
        clients.push(client);
    }

    let sheets = config
        .tool_servers
        .iter()
        .position(|t| t.name == SHEETS_ALIAS)
        .map(|i| clients[i].clone());

    let agent = ChatAgent::new(backend, providers).with_max_rounds(config.model.max_rounds);
    let state = Arc::new(AppState {
        agent,
        context: ContextBuilder::new(sheets),
        sessions: Mutex::new(HashMap::new()),
    });

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for client in &clients {
        client.close().await;
    }
    info!("tool servers closed");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}
