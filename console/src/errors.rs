//! Error types for the deployment console

use thiserror::Error;

/// Main error type for the deployment console
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Missing or invalid configuration, including absent credentials.
    /// Never retried.
    #[error("{0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    /// Source-hosting API failure (repository lookup, branch listing)
    #[error("GitHub error: {0}")]
    SourceHostError(String),

    /// Deployment provider API failure (create or poll request)
    #[error("{0}")]
    ProviderError(String),

    /// The provider reported its build as failed
    #[error("Vercel build failed: {0}")]
    ProviderBuildFailed(String),

    /// The provider build was canceled before it became ready
    #[error("Vercel build was canceled")]
    ProviderBuildCanceled,

    /// The provider never reached a ready state within the poll ceiling
    #[error("Deployment timeout - build took too long ({attempts} polls)")]
    PollTimeout { attempts: u32 },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Observer channel closed: {0}")]
    ChannelClosed(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for ConsoleError {
    fn from(err: anyhow::Error) -> Self {
        ConsoleError::Internal(err.to_string())
    }
}

/// Result alias used throughout the console
pub type ConsoleResult<T> = Result<T, ConsoleError>;
