//! Error types for the analysis core
//!
//! [`AnalysisError`] is the taxonomy callers see. Engine and rules failures are
//! translated into it at the component boundary. Cache failures use
//! [`CacheError`] and never leave the cache layer.

use thiserror::Error;

/// Errors that can reach the caller of [`crate::AnalysisService::analyse`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Position descriptor failed structural or rules validation
    #[error("Invalid FEN: {message}")]
    MalformedPosition { message: String },

    /// Requested depth or breadth outside the supported range
    #[error("Invalid analysis parameters: {message}")]
    InvalidParameters { message: String },

    /// Engine process missing, failed to launch, or died mid-query
    #[error("Engine unavailable: {message}")]
    EngineUnavailable { message: String },

    /// Engine returned no usable line for a non-terminal position
    #[error("Engine returned no moves for FEN: {position}")]
    NoMovesReturned { position: String },

    /// Engine reported a move the rules engine rejects
    #[error("Engine returned an illegal move {uci_move} for FEN: {position}")]
    InvalidEngineOutput { position: String, uci_move: String },
}

impl AnalysisError {
    pub fn malformed(message: impl Into<String>) -> Self {
        AnalysisError::MalformedPosition {
            message: message.into(),
        }
    }

    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        AnalysisError::EngineUnavailable {
            message: message.into(),
        }
    }

    /// True when the caller sent bad input (4xx class)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::MalformedPosition { .. } | AnalysisError::InvalidParameters { .. }
        )
    }
}

/// Result type alias for analysis operations
pub type AnalysisOutcome<T> = Result<T, AnalysisError>;

/// Failures inside a cache backend. Logged, never surfaced.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache backend unavailable: {message}")]
    Unavailable { message: String },
}

/// Settings rejected at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}
