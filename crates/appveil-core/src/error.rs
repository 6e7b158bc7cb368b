//! Shared error type across appveil crates.

use thiserror::Error;

/// Stable error codes surfaced by diagnostics output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Durable storage could not be read or written.
    Storage,
    /// Encoded policy text could not be produced.
    Codec,
    /// Linked apps were edited for a subject that is not sandboxed.
    NotWhitelisted,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config or consumer protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Storage => "STORAGE",
            ErrorCode::Codec => "CODEC",
            ErrorCode::NotWhitelisted => "NOT_WHITELISTED",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AppVeilError>;

/// Unified error type used by core and bridge.
#[derive(Debug, Error)]
pub enum AppVeilError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("codec: {0}")]
    Codec(String),
    #[error("not whitelisted: {0}")]
    NotWhitelisted(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AppVeilError {
    /// Map the error to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppVeilError::Storage(_) => ErrorCode::Storage,
            AppVeilError::Codec(_) => ErrorCode::Codec,
            AppVeilError::NotWhitelisted(_) => ErrorCode::NotWhitelisted,
            AppVeilError::BadConfig(_) => ErrorCode::BadConfig,
            AppVeilError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            AppVeilError::Internal(_) => ErrorCode::Internal,
        }
    }
}
