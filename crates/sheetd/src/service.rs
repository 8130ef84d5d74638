//! JSON-RPC request handling for the workbook tool server.

use mcp::{
    CallToolParams, CallToolResult, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, PROTOCOL_VERSION, PeerInfo, ServerCapabilities, Tool,
    ToolContent, ToolsCapability,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::workbook::WorkbookStore;

pub struct SheetService {
    store: WorkbookStore,
}

impl SheetService {
    pub fn new(store: WorkbookStore) -> Self {
        Self { store }
    }

    /// Handle one incoming message. Notifications get no response.
    pub fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize()),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: tool_definitions(),
                },
            ),
            "tools/call" => self.call(id, request.params),
            other => JsonRpcResponse::failure(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: PeerInfo {
                name: "sheetd".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    fn call(&self, id: mcp::RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::failure(id, JsonRpcError::invalid_params(e.to_string()));
            }
            None => {
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_params("missing tools/call params"),
                );
            }
        };

        let arguments = params.arguments.unwrap_or(Value::Object(Map::new()));
        debug!(tool = %params.name, "tool call");

        // Domain failures are tool results, not protocol errors.
        match self.dispatch_tool(&params.name, arguments) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::success(id, CallToolResult::error(e.to_string())),
        }
    }

    fn dispatch_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        match name {
            "list_workbook_files" => self.list_workbook_files(),
            "read_sheet" => self.read_sheet(parse_args(arguments)?),
            "read_range" => self.read_range(parse_args(arguments)?),
            "write_cell" => self.write_cell(parse_args(arguments)?),
            "append_row" => self.append_row(parse_args(arguments)?),
            other => Err(Error::UnknownTool(other.to_string())),
        }
    }

    fn list_workbook_files(&self) -> Result<CallToolResult> {
        let content = self
            .store
            .list_files()?
            .into_iter()
            .map(|name| ToolContent::Text { text: name })
            .collect();
        Ok(CallToolResult {
            content,
            is_error: false,
        })
    }

    fn read_sheet(&self, args: ReadSheetArgs) -> Result<CallToolResult> {
        let workbook = self.store.load(&args.file_name)?;
        let sheet = workbook.sheet(args.sheet_name.as_deref())?;
        let records = Value::Array(sheet.records());
        Ok(CallToolResult::text(records.to_string()))
    }

    fn read_range(&self, args: ReadRangeArgs) -> Result<CallToolResult> {
        let workbook = self.store.load(&args.file_name)?;
        let sheet = workbook.sheet(Some(&args.sheet_name))?;
        let records = Value::Array(sheet.records_in_range(args.start_row, args.end_row));
        Ok(CallToolResult::text(records.to_string()))
    }

    fn write_cell(&self, args: WriteCellArgs) -> Result<CallToolResult> {
        let mut workbook = self.store.load(&args.file_name)?;
        workbook
            .sheet_mut(&args.sheet_name)?
            .write_cell(args.row, args.col, args.value)?;
        self.store.save(&args.file_name, &workbook)?;
        Ok(CallToolResult::text(format!(
            "Cell [{}, {}] updated in '{}'.",
            args.row, args.col, args.file_name
        )))
    }

    fn append_row(&self, args: AppendRowArgs) -> Result<CallToolResult> {
        let mut workbook = self.store.load(&args.file_name)?;
        workbook
            .sheet_mut(&args.sheet_name)?
            .append_record(args.row_data)?;
        self.store.save(&args.file_name, &workbook)?;
        Ok(CallToolResult::text(format!(
            "Row added to '{}'.",
            args.file_name
        )))
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(Error::InvalidArguments)
}

#[derive(Debug, Deserialize)]
struct ReadSheetArgs {
    file_name: String,
    #[serde(default)]
    sheet_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadRangeArgs {
    file_name: String,
    sheet_name: String,
    start_row: usize,
    end_row: usize,
}

#[derive(Debug, Deserialize)]
struct WriteCellArgs {
    file_name: String,
    sheet_name: String,
    row: usize,
    col: usize,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct AppendRowArgs {
    file_name: String,
    sheet_name: String,
    row_data: Map<String, Value>,
}

/// The tools this server advertises.
fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: "list_workbook_files".to_string(),
            description: Some("Returns the names of the available workbook files".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "read_sheet".to_string(),
            description: Some(
                "Reads an entire sheet from a workbook and returns its rows".to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_name": {"type": "string", "description": "Workbook file name"},
                    "sheet_name": {
                        "type": "string",
                        "description": "Sheet to read, default first sheet"
                    }
                },
                "required": ["file_name"]
            }),
        },
        Tool {
            name: "read_range".to_string(),
            description: Some("Reads the given rows from a sheet".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_name": {"type": "string", "description": "Workbook file name"},
                    "sheet_name": {"type": "string", "description": "Sheet name"},
                    "start_row": {"type": "integer", "description": "Start row index (0-based)"},
                    "end_row": {"type": "integer", "description": "End row index (inclusive)"}
                },
                "required": ["file_name", "sheet_name", "start_row", "end_row"]
            }),
        },
        Tool {
            name: "write_cell".to_string(),
            description: Some("Writes a value into one cell of a sheet".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_name": {"type": "string", "description": "Workbook file name"},
                    "sheet_name": {"type": "string", "description": "Sheet name"},
                    "row": {"type": "integer", "description": "Row index (0-based)"},
                    "col": {"type": "integer", "description": "Column index (0-based)"},
                    "value": {"type": "string", "description": "New value"}
                },
                "required": ["file_name", "sheet_name", "row", "col", "value"]
            }),
        },
        Tool {
            name: "append_row".to_string(),
            description: Some("Appends a new row to a sheet".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_name": {"type": "string", "description": "Workbook file name"},
                    "sheet_name": {"type": "string", "description": "Sheet name"},
                    "row_data": {
                        "type": "object",
                        "description": "New row as {column: value}"
                    }
                },
                "required": ["file_name", "sheet_name", "row_data"]
            }),
        },
    ]
}
