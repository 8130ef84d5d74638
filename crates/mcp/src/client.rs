//! Tool-server client (spawn, handshake, request/response, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PeerInfo, RequestId, Tool,
};

/// Default timeout for tool-server operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum response line size (1MB).
/// Sized for large tool outputs (full sheet reads).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Configuration for a tool-server process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

struct Connection {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    server: PeerInfo,
}

/// Client for one tool-server process.
///
/// Construction performs no I/O; [`Client::connect`] spawns the process and
/// runs the initialize handshake. The connection is a single ordered
/// request/response channel, so all requests are serialized behind one lock.
pub struct Client {
    config: ClientConfig,
    conn: Mutex<Option<Connection>>,
    next_id: AtomicI64,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            conn: Mutex::new(None),
            next_id: AtomicI64::new(1),
        }
    }

    /// Get the configured provider name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Spawn the tool-server process and perform the initialize handshake.
    ///
    /// Calling this on an already-connected client is an error; close first.
    pub async fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        if guard.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .envs(&self.config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        let mut conn = Connection {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            server: PeerInfo {
                name: String::new(),
                version: String::new(),
            },
        };

        let id = self.next_request_id();
        let request =
            JsonRpcRequest::new(id.clone(), "initialize").with_params(InitializeParams::default());
        let value = Self::roundtrip(&mut conn, id, &request).await?;
        let init: InitializeResult = serde_json::from_value(value)?;

        Self::send(&mut conn, &JsonRpcRequest::notification("notifications/initialized")).await?;

        conn.server = init.server_info;
        *guard = Some(conn);
        Ok(())
    }

    /// Whether a connection is currently established.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Name and version reported by the server during the handshake.
    pub async fn server_info(&self) -> Option<PeerInfo> {
        self.conn.lock().await.as_ref().map(|c| c.server.clone())
    }

    /// Query the server for its currently offered tools.
    ///
    /// No caching: every call hits the server.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        Ok(result.tools)
    }

    /// Invoke one named tool.
    ///
    /// A result flagged `is_error` by the server surfaces as
    /// [`Error::ToolCallFailed`] carrying the server's message.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            let error_text = result
                .content
                .iter()
                .filter_map(|c| c.as_text())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::ToolCallFailed(error_text));
        }

        Ok(result)
    }

    /// Release the connection and terminate the server process.
    ///
    /// Safe to call when the client never connected (no-op). The child is
    /// also killed on drop, so resources are released on every exit path.
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(mut conn) = guard.take() {
            // Closing stdin lets a well-behaved server exit on its own.
            drop(conn.stdin);
            let _ = conn.child.kill().await;
        }
    }

    // --- Internal methods ---

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(Error::NotConnected)?;

        let value = Self::roundtrip(conn, id, &request).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn roundtrip(
        conn: &mut Connection,
        id: RequestId,
        request: &JsonRpcRequest,
    ) -> Result<serde_json::Value> {
        Self::send(conn, request).await?;

        let response = timeout(DEFAULT_TIMEOUT, Self::read_response(conn))
            .await
            .map_err(|_| Error::Timeout)??;

        if response.id != id {
            return Err(Error::InvalidResponse(format!(
                "response ID mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        Ok(response.into_result()?)
    }

    async fn send(conn: &mut Connection, request: &JsonRpcRequest) -> Result<()> {
        let line = serde_json::to_string(request)?;
        conn.stdin.write_all(line.as_bytes()).await?;
        conn.stdin.write_all(b"\n").await?;
        conn.stdin.flush().await?;
        Ok(())
    }

    async fn read_response(conn: &mut Connection) -> Result<JsonRpcResponse> {
        loop {
            let mut line = String::new();
            let bytes_read = conn.stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(Error::ServerExited);
            }

            if line.len() > MAX_OUTPUT_SIZE {
                return Err(Error::OutputTooLarge {
                    size: line.len(),
                    max: MAX_OUTPUT_SIZE,
                });
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            // Server-initiated notifications are not responses; skip them.
            // Anything else unparseable is skipped too and bounded by the
            // request timeout.
            if let Ok(response) = serde_json::from_str::<JsonRpcResponse>(trimmed) {
                return Ok(response);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig {
            name: "sheets".to_string(),
            command: "sheetd".to_string(),
            args: vec!["--data-dir".to_string(), "./workbooks".to_string()],
            env: HashMap::new(),
        }
    }

    #[test]
    fn client_config_creation() {
        let client = Client::new(test_config());
        assert_eq!(client.name(), "sheets");
    }

    #[tokio::test]
    async fn requests_require_connection() {
        let client = Client::new(test_config());
        assert!(matches!(
            client.list_tools().await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(
            client.call_tool("read_sheet", None).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn close_without_connect_is_noop() {
        let client = Client::new(test_config());
        client.close().await;
        assert!(!client.is_connected().await);
    }
}
