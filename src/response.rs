//! Typed result of one completed fetch
//!
//! A reply moves through `Pending → Decoded → Validated → {Accepted,
//! Rejected}`. The codec produces a [`DecodedReply`]; the only way to obtain
//! a [`ConfigResponse`] is [`ConfigResponse::from_decoded`], which applies
//! every consistency invariant against the originating request. There is no
//! path that exposes a decoded-but-unvalidated reply, and a rejected reply
//! yields an error instead of a partially-populated response.

use bytes::Bytes;

use crate::error::{ConfigError, Result};
use crate::protocol::codec::DecodedReply;
use crate::protocol::ErrorCode;
use crate::request::ConfigRequest;
use crate::trace::Trace;
use crate::types::{Checksum, Generation};

/// A validated response from the configuration authority
#[derive(Debug, Clone)]
pub struct ConfigResponse {
    new_checksum: Checksum,
    new_generation: Generation,
    payload: Bytes,
    is_changed: bool,
    internal_redeploy: bool,
    is_error: bool,
    error_code: u32,
    error_message: String,
    trace: Trace,
}

impl ConfigResponse {
    /// Validate a decoded reply against the request that produced it
    ///
    /// Every invariant violation is a [`ConfigError::Validation`]; nothing
    /// is normalized or silently repaired. The checks are pure, so a late
    /// reply for an abandoned call can be parsed and dropped safely.
    pub(crate) fn from_decoded(decoded: DecodedReply, request: &ConfigRequest) -> Result<Self> {
        let body = decoded.body;

        if !body.new_checksum.is_well_formed() {
            return Err(ConfigError::validation(format!(
                "malformed checksum in reply: {:?}",
                body.new_checksum.as_str()
            )));
        }
        if body.new_generation < 0 {
            return Err(ConfigError::validation(format!(
                "negative generation in reply: {}",
                body.new_generation
            )));
        }
        if !body.trace.preserves(&request.trace) {
            return Err(ConfigError::validation(
                "reply trace dropped or reordered client events",
            ));
        }
        if body.is_error && body.is_changed {
            return Err(ConfigError::validation(
                "reply claims both error and changed",
            ));
        }
        if body.is_changed {
            if body.payload.is_empty() {
                return Err(ConfigError::validation(
                    "reply claims changed content but carries no payload",
                ));
            }
            if body.new_generation < request.current_generation {
                return Err(ConfigError::validation(format!(
                    "generation regressed: reply has {}, request already held {}",
                    body.new_generation, request.current_generation
                )));
            }
            // Checksum equality is authoritative for content, generation for
            // progress. Same generation and same content cannot be "changed".
            if body.new_generation == request.current_generation
                && body.new_checksum == request.last_known_checksum
            {
                return Err(ConfigError::validation(
                    "reply claims changed content but generation and checksum match the request",
                ));
            }
        } else {
            if !body.payload.is_empty() {
                return Err(ConfigError::validation(
                    "unchanged reply carries a payload",
                ));
            }
            if body.new_generation < request.current_generation {
                return Err(ConfigError::validation(format!(
                    "generation regressed: unchanged reply has {}, request already held {}",
                    body.new_generation, request.current_generation
                )));
            }
            // Checksum equality is authoritative for content: an unchanged
            // reply must return the content digest the request declared.
            // The empty sentinel on a first fetch declares no content.
            if !request.last_known_checksum.is_empty()
                && body.new_checksum != request.last_known_checksum
            {
                return Err(ConfigError::validation(format!(
                    "unchanged reply returned checksum {} but request declared {}",
                    body.new_checksum, request.last_known_checksum
                )));
            }
        }

        Ok(Self {
            new_checksum: body.new_checksum,
            new_generation: body.new_generation,
            payload: Bytes::from(body.payload),
            is_changed: body.is_changed,
            internal_redeploy: decoded.internal_redeploy,
            is_error: body.is_error,
            error_code: body.error_code,
            error_message: body.error_message,
            trace: body.trace,
        })
    }

    /// Digest of the authority's current config content
    pub fn new_checksum(&self) -> &Checksum {
        &self.new_checksum
    }

    /// The authority's current generation
    pub fn new_generation(&self) -> Generation {
        self.new_generation
    }

    /// Serialized config content; empty unless [`is_changed`](Self::is_changed)
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Whether the content differs from what the request declared
    pub fn is_changed(&self) -> bool {
        self.is_changed
    }

    /// Whether the authority asks for immediate application of the value
    pub fn is_internal_redeploy(&self) -> bool {
        self.internal_redeploy
    }

    /// Whether the authority failed to serve the request
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Authority error code, when [`is_error`](Self::is_error)
    ///
    /// Codes outside the known table map to [`ErrorCode::Unknown`].
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.is_error
            .then(|| ErrorCode::try_from(self.error_code).unwrap_or(ErrorCode::Unknown))
    }

    /// Authority error message, when [`is_error`](Self::is_error)
    pub fn error_message(&self) -> Option<&str> {
        self.is_error.then_some(self.error_message.as_str())
    }

    /// The request's trace with authority events appended
    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}
