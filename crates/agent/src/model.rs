//! Model backend abstraction.
//!
//! Backends translate conversation turns and tool schemas into a provider's
//! wire format and normalize the reply back into plain values, so the loop
//! never sees provider-specific representations.

use std::future::Future;

use thiserror::Error;

use crate::catalog::ToolSchema;
use crate::turn::{ToolCallRequest, Turn};

/// Errors from model-service calls. Never locally recovered: a failed model
/// call ends the run.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network: {0}")]
    Network(String),

    #[error("provider api: {0}")]
    Api(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Everything needed for one model call.
#[derive(Debug, Clone)]
pub struct ModelRequest<'a> {
    pub turns: &'a [Turn],
    pub tools: &'a [ToolSchema],
}

/// A normalized piece of the model's reply.
#[derive(Debug, Clone)]
pub enum ReplyPart {
    Text(String),
    ToolCall(ToolCallRequest),
}

/// The model's reply, normalized at the backend boundary.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub parts: Vec<ReplyPart>,
}

impl ModelReply {
    /// Combined text content (empty when the reply carries none).
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ReplyPart::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// The tool calls requested by this reply.
    ///
    /// Empty when the model issued none, which is the normal
    /// final-answer case.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ReplyPart::ToolCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Trait for model-service backends.
pub trait ModelBackend: Send + Sync {
    fn generate(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelReply, ModelError>> + Send;
}
