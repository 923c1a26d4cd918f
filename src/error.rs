//! Error types for Quill.

use thiserror::Error;

/// Library-level error type for Quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Content generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Unauthorized")]
    Auth,

    #[error("Metrics store error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures reported by a tool agent bridge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("step budget exceeded ({0} steps)")]
    StepBudgetExceeded(usize),

    #[error("tool call failed: {0}")]
    ToolFailed(String),

    #[error("tool not allowed: {0}")]
    ToolNotAllowed(String),

    #[error("agent unreachable: {0}")]
    Unreachable(String),

    /// A failure reason passed through verbatim from the agent.
    #[error("{0}")]
    Reported(String),
}

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_is_transparent() {
        let err: QuillError = AgentError::Reported("step budget exceeded".to_string()).into();
        assert_eq!(err.to_string(), "step budget exceeded");
    }

    #[test]
    fn test_backend_error_display() {
        let err = QuillError::Backend {
            status: 404,
            message: "rest_post_invalid_id".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 404: rest_post_invalid_id");
    }
}
