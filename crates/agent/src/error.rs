use thiserror::Error;

use crate::model::ModelError;

/// Errors that end a run.
///
/// Provider faults never appear here: listing failures drop the provider
/// from the round, invocation failures become per-call error results.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("duplicate tool name '{name}' advertised by providers '{first}' and '{second}'")]
    DuplicateTool {
        name: String,
        first: String,
        second: String,
    },

    #[error("tool round limit ({0}) exceeded with no final answer")]
    RoundLimit(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
