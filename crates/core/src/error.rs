use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("config error: {0}")]
    Config(String),

    /// A payload that is not a usable numeric reading.
    #[error("payload error: {0}")]
    Parse(String),

    #[error("broker error: {0}")]
    Connection(String),

    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
