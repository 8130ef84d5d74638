//! Purser agent core — the tool-orchestration loop.
//!
//! This crate drives the cycle between a model backend and a set of remote
//! tool providers:
//!
//! - **History**: per-session conversation state, owned by the caller and
//!   passed into each run.
//! - **ToolCatalog**: schemas aggregated from every provider each round,
//!   normalized for the model and indexed by tool name for routing.
//! - **dispatch**: order-preserving batch execution with per-call failure
//!   isolation.
//! - **ChatAgent**: the loop itself — ask, dispatch, resume, until the model
//!   answers in plain text or the round limit is reached.
//!
//! # Example
//!
//! ```ignore
//! use agent::{ChatAgent, GeminiBackend, History, ProviderSet};
//! use std::sync::Arc;
//!
//! # async fn example(client: Arc<mcp::Client>) -> agent::Result<()> {
//! let backend = GeminiBackend::new("AIza...");
//! let providers = ProviderSet::new().register("sheets", client);
//! let agent = ChatAgent::new(backend, providers);
//!
//! let mut history = History::new();
//! let reply = agent.answer(&mut history, "Which workbooks do we have?").await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

mod catalog;
mod dispatch;
mod error;
mod gemini;
mod model;
mod orchestrator;
mod provider;
mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{ToolCatalog, ToolSchema, clean_schema};
pub use dispatch::dispatch;
pub use error::{Error, Result};
pub use gemini::GeminiBackend;
pub use model::{ModelBackend, ModelError, ModelReply, ModelRequest, ReplyPart};
pub use orchestrator::ChatAgent;
pub use provider::{ProviderError, ProviderSet, ToolDescriptor, ToolProvider};
pub use turn::{
    History, OutcomePayload, Part, Role, SessionId, ToolCallOutcome, ToolCallRequest, Turn,
};
