//! Tool schema aggregation and routing.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::provider::{ProviderSet, ToolProvider};

/// A tool schema in the form the model consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One round's view of the registered providers: normalized schemas plus the
/// tool-name → provider-alias routing table.
///
/// Rebuilt from `list_tools()` once per round; never cached across rounds.
#[derive(Debug)]
pub struct ToolCatalog {
    schemas: Vec<ToolSchema>,
    routes: HashMap<String, String>,
}

impl ToolCatalog {
    /// Collect tool schemas from every provider.
    ///
    /// A provider whose listing fails is logged and skipped; the model just
    /// sees fewer tools that round. Two providers advertising the same tool
    /// name is a configuration error.
    pub async fn collect<P: ToolProvider>(providers: &ProviderSet<P>) -> Result<Self> {
        let mut schemas = Vec::new();
        let mut routes: HashMap<String, String> = HashMap::new();

        for (alias, provider) in providers.iter() {
            let tools = match provider.list_tools().await {
                Ok(tools) => tools,
                Err(e) => {
                    warn!(provider = alias, error = %e, "failed to list tools, skipping provider");
                    continue;
                }
            };

            for tool in tools {
                if let Some(first) = routes.get(&tool.name) {
                    return Err(Error::DuplicateTool {
                        name: tool.name,
                        first: first.clone(),
                        second: alias.to_string(),
                    });
                }
                routes.insert(tool.name.clone(), alias.to_string());
                schemas.push(ToolSchema {
                    name: tool.name,
                    description: tool.description.unwrap_or_default(),
                    parameters: clean_schema(&tool.input_schema),
                });
            }
        }

        Ok(Self { schemas, routes })
    }

    /// The normalized schemas, in provider registration order.
    pub fn schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Resolve a tool name to its provider alias.
    pub fn resolve(&self, tool_name: &str) -> Option<&str> {
        self.routes.get(tool_name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Schema keywords the model's dialect does not accept.
const STRIPPED_KEYWORDS: [&str; 6] = [
    "title",
    "$schema",
    "description",
    "default",
    "anyOf",
    "additionalProperties",
];

/// Recursively strip unsupported keywords from a JSON-Schema tree.
///
/// Deterministic and idempotent: normalizing twice yields the same output
/// as once.
pub fn clean_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| !STRIPPED_KEYWORDS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), clean_schema(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(clean_schema).collect()),
        other => other.clone(),
    }
}
