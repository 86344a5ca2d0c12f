//! Application error model
//!
//! Defines a typed error hierarchy using `thiserror` for internal error
//! handling. Errors never cross the tool boundary as-is: the dispatch surface
//! renders every variant into a one-line diagnostic string, and adapters that
//! can carry more structure use [`AppError::code`] alongside it.

use thiserror::Error;

/// Application error type
///
/// Covers every failure the Gmail bridge may encounter below the tool
/// boundary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid user input (validation failed, malformed request)
    #[error("{0}")]
    InvalidInput(String),
    /// Provider answered with a non-success HTTP status
    #[error("Gmail API error: {status}{}", .message.as_deref().map(|m| format!(" - {m}")).unwrap_or_default())]
    Provider {
        /// HTTP status code returned by the provider
        status: u16,
        /// Provider's structured error message, if it could be decoded
        message: Option<String>,
    },
    /// No response was obtained (connect, DNS, timeout, body read)
    #[error("Gmail API request failed: {0}")]
    Transport(String),
    /// Bearer credential could not be acquired
    #[error("credential unavailable: {0}")]
    Credential(String),
    /// Provider payload violates structural limits or cannot be decoded
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Internal error (unexpected failure, external crate error)
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for `InvalidInput`
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Stable machine-readable code for this error kind
    ///
    /// # Mappings
    ///
    /// - `InvalidInput` → `invalid_input`
    /// - `Provider` → `provider_error`
    /// - `Transport` → `transport_error`
    /// - `Credential` → `credential_error`
    /// - `Malformed` → `malformed_payload`
    /// - `Internal` → `internal`
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Provider { .. } => "provider_error",
            Self::Transport(_) => "transport_error",
            Self::Credential(_) => "credential_error",
            Self::Malformed(_) => "malformed_payload",
            Self::Internal(_) => "internal",
        }
    }
}

/// Type alias for fallible return values
///
/// Use this for all internal functions that can fail. Provides a consistent
/// error type throughout the codebase.
pub type AppResult<T> = Result<T, AppError>;
