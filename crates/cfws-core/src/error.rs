//! Shared error type across cfws crates.

use thiserror::Error;

/// Stable error kinds, named after the DOM exceptions a browser socket raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation not allowed in the current ready state.
    InvalidState,
    /// Close code outside the permitted range.
    InvalidAccess,
    /// Malformed argument (close reason, URL, protocol list).
    Syntax,
    /// Socket task or channel is gone.
    Network,
    /// Configuration rejected.
    BadConfig,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidState => "INVALID_STATE_ERR",
            ErrorKind::InvalidAccess => "INVALID_ACCESS_ERR",
            ErrorKind::Syntax => "SYNTAX_ERR",
            ErrorKind::Network => "NETWORK_ERR",
            ErrorKind::BadConfig => "BAD_CONFIG",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CfwsError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum CfwsError {
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid close code: {0}")]
    InvalidCloseCode(u16),
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CfwsError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CfwsError::InvalidState(_) => ErrorKind::InvalidState,
            CfwsError::InvalidCloseCode(_) => ErrorKind::InvalidAccess,
            CfwsError::Syntax(_) => ErrorKind::Syntax,
            CfwsError::Transport(_) => ErrorKind::Network,
            CfwsError::BadConfig(_) => ErrorKind::BadConfig,
            CfwsError::Internal(_) => ErrorKind::Internal,
        }
    }
}
