//! Error types for td-glance.
//!
//! Every layer forwards the first failure it sees; nothing here is retried.

use thiserror::Error;

/// Main error type for job submission, polling and metadata calls.
#[derive(Error, Debug)]
pub enum TdError {
    /// Network, HTTP or authentication failure from any remote call.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine reported the job as failed.
    #[error("Query execution error: {0}")]
    Engine(String),

    /// The cancel handle was invoked and the job reached a terminal state.
    #[error("Query is canceled")]
    Canceled,

    /// Malformed schema JSON or a malformed result line.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid or missing connection settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A second query was started on an adapter that already has one in flight.
    #[error("A query is already running on this connection")]
    Busy,

    /// Unexpected states, bugs, etc.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TdError {
    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates an engine error with the given message.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Creates a parse error with the given message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this error is the result of a user cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Transport Error",
            Self::Engine(_) => "Query Execution Error",
            Self::Canceled => "Query Canceled",
            Self::Parse(_) => "Parse Error",
            Self::Config(_) => "Configuration Error",
            Self::Busy => "Busy",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using TdError.
pub type Result<T> = std::result::Result<T, TdError>;
