//! The conversation loop.

use tracing::{debug, warn};

use crate::catalog::ToolCatalog;
use crate::dispatch::dispatch;
use crate::error::{Error, Result};
use crate::model::{ModelBackend, ModelReply, ModelRequest};
use crate::provider::{ProviderSet, ToolProvider};
use crate::turn::{History, Turn};

const DEFAULT_MAX_ROUNDS: usize = 8;

/// Drives the ask → dispatch → resume cycle until the model produces a
/// final text answer.
///
/// Holds no conversation state: history is owned by the caller and passed
/// into each [`ChatAgent::answer`] run, so one agent instance can serve
/// many sessions concurrently.
pub struct ChatAgent<B, P> {
    backend: B,
    providers: ProviderSet<P>,
    max_rounds: usize,
}

impl<B: ModelBackend, P: ToolProvider> ChatAgent<B, P> {
    pub fn new(backend: B, providers: ProviderSet<P>) -> Self {
        Self {
            backend,
            providers,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Cap the number of tool rounds in one run.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Run one user query to completion and return the final answer.
    ///
    /// Tool and provider faults are contained per call or per provider;
    /// only model-call failures, duplicate tool names, and round-limit
    /// exhaustion without salvageable text end the run with an error.
    pub async fn answer(&self, history: &mut History, prompt: &str) -> Result<String> {
        history.push(Turn::user(prompt));

        let mut catalog = ToolCatalog::collect(&self.providers).await?;
        let mut reply = self.generate(history, &catalog).await?;
        let mut round = 0;

        loop {
            let requests = reply.tool_calls();

            if requests.is_empty() {
                let text = reply.text();
                history.push(Turn::assistant(&text));
                return Ok(text);
            }

            round += 1;
            if round > self.max_rounds {
                let text = reply.text();
                if text.is_empty() {
                    return Err(Error::RoundLimit(self.max_rounds));
                }
                warn!(
                    rounds = self.max_rounds,
                    "round limit reached, returning last text"
                );
                history.push(Turn::assistant(&text));
                return Ok(text);
            }

            if round > 1 {
                // The resumption's commentary before the next tool round.
                let commentary = reply.text();
                if !commentary.is_empty() {
                    history.push(Turn::assistant(commentary));
                }
                catalog = ToolCatalog::collect(&self.providers).await?;
            }

            debug!(round, count = requests.len(), "model requested tools");
            let outcomes = dispatch(&catalog, &self.providers, requests).await;
            history.push(Turn::tool_results(outcomes));

            reply = self.generate(history, &catalog).await?;
        }
    }

    async fn generate(&self, history: &History, catalog: &ToolCatalog) -> Result<ModelReply> {
        let request = ModelRequest {
            turns: history.turns(),
            tools: catalog.schemas(),
        };
        Ok(self.backend.generate(request).await?)
    }
}
