//! Unified error types for the NPS engine.
//!
//! Error codes:
//! - STORE_001: Persistence backend failure
//! - SER_001: Serialization failure
//! - FETCH_001-002: Transport and backend failures during sync
//! - CONFIG_001: Invalid configuration
//! - INTERNAL_001: Everything else

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Fetch error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorCode {
    /// FETCH_001: Request could not be completed or returned a non-2xx status
    Transport,
    /// FETCH_002: Backend answered but reported `success: false`
    Rejected,
}

impl FetchErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "FETCH_001",
            Self::Rejected => "FETCH_002",
        }
    }
}

/// Unified error type for the NPS engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("[STORE_001] storage error: {0}")]
    Storage(String),

    #[error("[SER_001] serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport failure, optionally with the HTTP status that caused it.
    #[error("[FETCH_001] fetch failed: {message}")]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    #[error("[FETCH_002] backend rejected request: {0}")]
    Backend(String),

    #[error("[CONFIG_001] invalid configuration: {0}")]
    Config(String),

    #[error("[INTERNAL_001] internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a transport error.
    pub fn fetch(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            status,
            message: msg.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage(_) => "STORE_001",
            Self::Serialization(_) => "SER_001",
            Self::Fetch { .. } => FetchErrorCode::Transport.code(),
            Self::Backend(_) => FetchErrorCode::Rejected.code(),
            Self::Config(_) => "CONFIG_001",
            Self::Internal(_) => "INTERNAL_001",
        }
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Client-side HTTP statuses (4xx) are not transient; everything else on
    /// the fetch path is.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch { status, .. } => !matches!(status, Some(s) if (400..500).contains(s)),
            Self::Backend(_) | Self::Storage(_) => true,
            Self::Serialization(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }
}
