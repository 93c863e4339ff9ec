use thiserror::Error;

/// Failures the engine reports instead of degrading to a neutral default.
///
/// Missing optional data is never an error; only structurally invalid
/// records and broken configuration end up here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
