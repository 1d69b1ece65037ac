//! Error types for Intake Assist.

use std::time::Duration;

/// Top-level error type for the intake engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel-related errors — delivery to the end user did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} rejected the message: HTTP {status}")]
    Rejected { name: String, status: u16 },

    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}

/// Oracle (generative-text) errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Oracle call timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Conversation-flow integrity errors.
///
/// These are recoverable: the engine discards the user's flow state and
/// instructs the user to restart.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("No recoverable question for a pending digression")]
    NoPriorQuestion,

    #[error("Question script exhausted before reaching the terminal key")]
    ScriptExhausted,

    #[error("Unknown question key: {0}")]
    UnknownKey(String),
}

/// Report-rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write report {filename}: {source}")]
    Write {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Report output directory unavailable: {0}")]
    OutputDir(std::io::Error),
}

/// Result type alias for the intake engine.
pub type Result<T> = std::result::Result<T, Error>;
