//! Gemini API backend.
//!
//! Speaks the `generateContent` REST endpoint. All provider-specific
//! response shapes are normalized to plain values here; absent or
//! unexpected fields degrade to an empty reply rather than an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::catalog::ToolSchema;
use crate::model::{ModelBackend, ModelError, ModelReply, ModelRequest, ReplyPart};
use crate::turn::{OutcomePayload, Part, Role, ToolCallRequest, Turn};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ApiToolGroup>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiToolGroup {
    function_declarations: Vec<ApiFunctionDecl>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDecl {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    role: &'static str,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

impl ApiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_response: None,
        }
    }

    fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            text: None,
            function_response: Some(ApiFunctionResponse {
                name: name.into(),
                response,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiCandidate {
    #[serde(default)]
    content: ApiReplyContent,
}

#[derive(Debug, Default, Deserialize)]
struct ApiReplyContent {
    #[serde(default)]
    parts: Vec<ApiReplyPart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiReplyPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<ApiFunctionCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

fn role_to_api(role: Role) -> &'static str {
    match role {
        Role::User | Role::Tool => "user",
        Role::Assistant => "model",
    }
}

fn turn_to_api(turn: &Turn) -> ApiContent {
    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            Part::Text { text } => ApiPart::text(text.clone()),
            Part::ToolResult(outcome) => {
                let response = match &outcome.payload {
                    OutcomePayload::Content(blocks) => json!({ "content": blocks }),
                    OutcomePayload::Error(message) => json!({ "error": message }),
                };
                ApiPart::function_response(outcome.tool_name.clone(), response)
            }
        })
        .collect();

    ApiContent {
        role: role_to_api(turn.role),
        parts,
    }
}

fn schema_to_api(schema: &ToolSchema) -> ApiFunctionDecl {
    ApiFunctionDecl {
        name: schema.name.clone(),
        description: schema.description.clone(),
        parameters: schema.parameters.clone(),
    }
}

fn plain_arguments(args: Option<Value>) -> Map<String, Value> {
    match args {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn reply_from_response(response: ApiResponse) -> ModelReply {
    let mut parts = Vec::new();
    for candidate in response.candidates {
        for part in candidate.content.parts {
            if let Some(text) = part.text
                && !text.is_empty()
            {
                parts.push(ReplyPart::Text(text));
            }
            if let Some(call) = part.function_call {
                parts.push(ReplyPart::ToolCall(ToolCallRequest::new(
                    call.name,
                    plain_arguments(call.args),
                )));
            }
        }
    }
    ModelReply { parts }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Gemini REST backend.
pub struct GeminiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl ModelBackend for GeminiBackend {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        let contents = request.turns.iter().map(turn_to_api).collect();
        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![ApiToolGroup {
                function_declarations: request.tools.iter().map(schema_to_api).collect(),
            }])
        };

        let api_request = ApiRequest { contents, tools };
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Ok(reply_from_response(api_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::ToolCallOutcome;

    #[test]
    fn extracts_function_calls_and_text() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Let me check."},
                        {"functionCall": {"name": "read_sheet", "args": {"file_name": "accounts.json"}}}
                    ]
                }
            }]
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        let reply = reply_from_response(response);

        assert_eq!(reply.text(), "Let me check.");
        let calls = reply.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "read_sheet");
        assert_eq!(
            calls[0].arguments.get("file_name"),
            Some(&Value::String("accounts.json".to_string()))
        );
    }

    #[test]
    fn degenerate_shapes_yield_empty_reply() {
        for json in [
            "{}",
            r#"{"candidates": []}"#,
            r#"{"candidates": [{}]}"#,
            r#"{"candidates": [{"content": {}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{}]}}]}"#,
        ] {
            let response: ApiResponse = serde_json::from_str(json).unwrap();
            let reply = reply_from_response(response);
            assert!(reply.tool_calls().is_empty(), "input: {json}");
            assert_eq!(reply.text(), "", "input: {json}");
        }
    }

    #[test]
    fn missing_args_become_empty_map() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"functionCall": {"name": "list_workbook_files"}}]}
            }]
        }"#;
        let response: ApiResponse = serde_json::from_str(json).unwrap();
        let calls = reply_from_response(response).tool_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].arguments.is_empty());
    }

    #[test]
    fn roles_map_to_wire_names() {
        assert_eq!(role_to_api(Role::User), "user");
        assert_eq!(role_to_api(Role::Assistant), "model");
        assert_eq!(role_to_api(Role::Tool), "user");
    }

    #[test]
    fn tool_turn_renders_function_responses() {
        let turn = Turn::tool_results(vec![
            ToolCallOutcome::content("read_sheet", vec!["[{\"Name\":\"Acme\"}]".to_string()]),
            ToolCallOutcome::error("write_cell", "row out of range"),
        ]);
        let content = turn_to_api(&turn);
        let value = serde_json::to_value(&content).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(
            value["parts"][0]["functionResponse"]["name"],
            "read_sheet"
        );
        assert!(value["parts"][0]["functionResponse"]["response"]["content"].is_array());
        assert_eq!(
            value["parts"][1]["functionResponse"]["response"]["error"],
            "row out of range"
        );
    }

    #[test]
    fn tools_are_omitted_when_empty() {
        let api_request = ApiRequest {
            contents: vec![turn_to_api(&Turn::user("hello"))],
            tools: None,
        };
        let value = serde_json::to_value(&api_request).unwrap();
        assert!(value.get("tools").is_none());
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn schemas_render_as_function_declarations() {
        let schema = ToolSchema {
            name: "read_sheet".to_string(),
            description: "Read a sheet".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let api_request = ApiRequest {
            contents: vec![],
            tools: Some(vec![ApiToolGroup {
                function_declarations: vec![schema_to_api(&schema)],
            }]),
        };
        let value = serde_json::to_value(&api_request).unwrap();
        assert_eq!(
            value["tools"][0]["functionDeclarations"][0]["name"],
            "read_sheet"
        );
    }
}
