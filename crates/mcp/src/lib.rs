//! MCP (Model Context Protocol) over stdio.
//!
//! This crate provides a client for tool-server processes speaking JSON-RPC
//! 2.0 over stdin/stdout, plus the protocol types a server needs to answer
//! from the other side.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, ClientConfig};
//! use std::collections::HashMap;
//!
//! # async fn example() -> mcp::Result<()> {
//! let client = Client::new(ClientConfig {
//!     name: "sheets".to_string(),
//!     command: "sheetd".to_string(),
//!     args: vec!["--data-dir".to_string(), "./workbooks".to_string()],
//!     env: HashMap::new(),
//! });
//!
//! client.connect().await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = client.call_tool("read_sheet", Some(serde_json::json!({
//!     "file_name": "accounts.json"
//! }))).await?;
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;

pub use client::{Client, ClientConfig, DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, InitializeParams, InitializeResult,
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, PeerInfo,
    RequestId, ServerCapabilities, Tool, ToolContent, ToolsCapability,
};
