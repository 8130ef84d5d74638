//! Shared test doubles at the two trait seams.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::model::{ModelBackend, ModelError, ModelReply, ModelRequest, ReplyPart};
use crate::provider::{ProviderError, ToolDescriptor, ToolProvider};
use crate::turn::ToolCallRequest;

/// In-memory tool provider with scripted responses and a call log.
#[derive(Default)]
pub struct FakeProvider {
    tools: Vec<ToolDescriptor>,
    responses: HashMap<String, Result<Vec<String>, String>>,
    list_error: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose `list_tools` always fails.
    pub fn failing_listing(message: impl Into<String>) -> Self {
        Self {
            list_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_tool(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        let description = description.into();
        self.tools.push(ToolDescriptor {
            name: name.into(),
            description: (!description.is_empty()).then_some(description),
            input_schema,
        });
        self
    }

    pub fn with_response(mut self, name: impl Into<String>, blocks: Vec<&str>) -> Self {
        self.responses.insert(
            name.into(),
            Ok(blocks.into_iter().map(str::to_string).collect()),
        );
        self
    }

    pub fn with_failure(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses.insert(name.into(), Err(message.into()));
        self
    }

    /// Number of `call_tool` invocations this provider received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ToolProvider for FakeProvider {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        if let Some(message) = &self.list_error {
            return Err(ProviderError::Connection(message.clone()));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, _arguments: Value) -> Result<Vec<String>, ProviderError> {
        self.calls.lock().unwrap().push(name.to_string());
        match self.responses.get(name) {
            Some(Ok(blocks)) => Ok(blocks.clone()),
            Some(Err(message)) => Err(ProviderError::Invocation(message.clone())),
            None => Err(ProviderError::Invocation(format!(
                "no scripted response for '{name}'"
            ))),
        }
    }
}

/// Backend that replays a fixed sequence of replies and records how many
/// turns each request carried.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ModelReply>>,
    seen_turn_counts: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen_turn_counts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Turn counts observed per request, shared with the test.
    pub fn log(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.seen_turn_counts)
    }
}

impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: ModelRequest<'_>) -> Result<ModelReply, ModelError> {
        self.seen_turn_counts
            .lock()
            .unwrap()
            .push(request.turns.len());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Api("script exhausted".to_string()))
    }
}

/// A reply carrying only text.
pub fn text_reply(text: &str) -> ModelReply {
    ModelReply {
        parts: vec![ReplyPart::Text(text.to_string())],
    }
}

/// A reply requesting a single tool call.
pub fn call_reply(name: &str, arguments: Value) -> ModelReply {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    ModelReply {
        parts: vec![ReplyPart::ToolCall(ToolCallRequest::new(name, arguments))],
    }
}
