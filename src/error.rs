use thiserror::Error;

/// Crate-wide error type.
///
/// Per-call tool failures (argument parse errors, unknown tools, tool
/// execution failures) are deliberately *not* represented here; they are
/// folded into the failing call's [`crate::models::ToolOutcome`] so one
/// broken tool call never aborts a turn. Only provider-level and
/// configuration failures surface as `AssistantError`.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for AssistantError {
    fn from(msg: String) -> Self {
        AssistantError::Other(msg)
    }
}

impl From<&str> for AssistantError {
    fn from(msg: &str) -> Self {
        AssistantError::Other(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
