//! CLI error types.

use tal_engine::EngineError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("invalid data file: {0}")]
    Data(#[from] serde_json::Error),
}
