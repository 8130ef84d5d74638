//! Quick check of the tool-provider plumbing against a live sheetd.
//!
//! Run with: cargo run --example tool_check
//! (expects the `sheetd` binary on PATH)

use std::collections::HashMap;
use std::sync::Arc;

use agent::{ProviderSet, ToolCallRequest, ToolCatalog, dispatch};
use mcp::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Connecting to sheetd...\n");

    let client = Arc::new(Client::new(ClientConfig {
        name: "sheets".to_string(),
        command: "sheetd".to_string(),
        args: vec![
            "--data-dir".to_string(),
            "/tmp/purser-tool-check".to_string(),
            "--seed-demo".to_string(),
        ],
        env: HashMap::new(),
    }));
    client.connect().await?;

    let providers = ProviderSet::new().register("sheets", client.clone());
    let catalog = ToolCatalog::collect(&providers).await?;

    println!("Discovered {} tools:", catalog.schemas().len());
    for schema in catalog.schemas() {
        println!("  - {}: {}", schema.name, schema.description);
    }

    println!("\nDispatching list_workbook_files...");
    let outcomes = dispatch(
        &catalog,
        &providers,
        vec![ToolCallRequest::new(
            "list_workbook_files",
            serde_json::Map::new(),
        )],
    )
    .await;

    for outcome in &outcomes {
        println!("  {} -> {:?}", outcome.tool_name, outcome.payload);
    }

    client.close().await;
    println!("\nDone!");
    Ok(())
}
