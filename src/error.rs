//! Error types for confpoll
//!
//! We use `thiserror` for structured error types that can be matched on.
//! Every failure path maps to a distinct variant so callers can implement
//! backoff, version renegotiation, or fallback-to-cache without string
//! matching. The core itself never retries and never suppresses an error.

use thiserror::Error;

use crate::transport::TransportError;

/// Central error type for confpoll operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Caller-provided request fields were invalid. Fatal to that call;
    /// retrying without fixing the input cannot succeed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The channel failed before a reply arrived. Propagated untouched;
    /// retry policy belongs to the caller.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// Reply bytes did not parse under the expected protocol version
    #[error("decode failure under version {version}: {reason}")]
    Decode { version: u8, reason: String },

    /// The reply's version tag disagrees with the version the request was
    /// built with. Signals version skew: renegotiate, do not retry as-is.
    #[error("protocol version mismatch: request built with {requested}, reply tagged {replied}")]
    ProtocolMismatch { requested: u8, replied: u8 },

    /// The reply parsed but is internally inconsistent. Authority
    /// misbehavior; surfaced, never auto-corrected.
    #[error("response failed validation: {0}")]
    Validation(String),
}

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create a validation error
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ConfigError::Validation(msg.into())
    }

    /// Create a decode error for `version`
    pub(crate) fn decode(version: u8, reason: impl Into<String>) -> Self {
        ConfigError::Decode {
            version,
            reason: reason.into(),
        }
    }
}
