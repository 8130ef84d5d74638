//! Tool provider boundary.
//!
//! [`ToolProvider`] is the seam between the orchestration loop and remote
//! side effects: the production implementation is [`mcp::Client`], tests
//! substitute in-memory fakes.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// A tool as advertised by a provider, before schema normalization.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Failures at the provider boundary.
///
/// Both variants are contained by the loop: listing failures drop the
/// provider from the round, invocation failures become per-call error
/// results the model can read.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("connection: {0}")]
    Connection(String),

    #[error("invocation: {0}")]
    Invocation(String),
}

/// Trait for remote tool providers.
pub trait ToolProvider: Send + Sync {
    /// Query the provider's currently offered tools.
    fn list_tools(&self)
    -> impl Future<Output = Result<Vec<ToolDescriptor>, ProviderError>> + Send;

    /// Invoke one named tool, returning its text blocks.
    fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl Future<Output = Result<Vec<String>, ProviderError>> + Send;
}

impl ToolProvider for mcp::Client {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ProviderError> {
        let tools = mcp::Client::list_tools(self).await.map_err(provider_error)?;
        Ok(tools
            .into_iter()
            .map(|t| ToolDescriptor {
                name: t.name,
                description: t.description,
                input_schema: t.input_schema,
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<String>, ProviderError> {
        let arguments = match arguments {
            Value::Object(map) if map.is_empty() => None,
            Value::Null => None,
            other => Some(other),
        };

        let result = mcp::Client::call_tool(self, name, arguments)
            .await
            .map_err(provider_error)?;

        Ok(result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(str::to_string))
            .collect())
    }
}

fn provider_error(e: mcp::Error) -> ProviderError {
    match e {
        mcp::Error::Spawn(_)
        | mcp::Error::AlreadyConnected
        | mcp::Error::NotConnected
        | mcp::Error::ServerExited
        | mcp::Error::Io(_) => ProviderError::Connection(e.to_string()),
        other => ProviderError::Invocation(other.to_string()),
    }
}

/// The set of registered providers, fixed at construction.
///
/// Registration order is the deterministic iteration order used for schema
/// aggregation.
pub struct ProviderSet<P> {
    entries: Vec<(String, Arc<P>)>,
}

impl<P> ProviderSet<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a provider under an alias.
    pub fn register(mut self, alias: impl Into<String>, provider: Arc<P>) -> Self {
        self.entries.push((alias.into(), provider));
        self
    }

    pub fn get(&self, alias: &str) -> Option<&P> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, p)| p.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.entries.iter().map(|(a, p)| (a.as_str(), p.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P> Default for ProviderSet<P> {
    fn default() -> Self {
        Self::new()
    }
}
