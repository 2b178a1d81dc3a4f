//! Wire protocol definitions for confpoll
//!
//! ## Protocol Design Principles
//!
//! 1. **Binary format**: bincode payloads for efficiency and deterministic
//!    bytes (identical input encodes to identical output, which the golden
//!    protocol tests rely on)
//! 2. **Versioned**: every frame carries its protocol version; version 2
//!    additionally embeds the tag inside the payload envelope
//! 3. **Framed**: length-prefixed messages for reliable parsing
//!
//! ## Frame Format
//!
//! ```text
//! +----------------+----------------+------------------+
//! | Length (4B BE) | Version (1B)   | Payload (N bytes)|
//! +----------------+----------------+------------------+
//! ```
//!
//! The length counts the version byte plus the payload.
//!
//! ## Long-poll contract
//!
//! A request names the generation the client already holds and an optional
//! wanted floor. The authority may hold the request open until a newer
//! generation exists or its own timeout elapses, then replies either way.
//! An "unchanged, timed out" reply is success, not failure; it is what makes
//! change detection cheap without client-side polling storms.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod message;

pub use codec::{CodecV1, CodecV2, WireCodec};
pub use message::{RequestPayload, ResponsePayload};

/// Maximum frame size (4 MB)
///
/// Config payloads are small; this bound exists to stop a misbehaving
/// authority from exhausting client memory.
pub const MAX_FRAME_SIZE: usize = 4 * 1024 * 1024;

/// Minimum frame size: 4 bytes length + 1 byte version
pub const MIN_FRAME_SIZE: usize = 5;

/// Length of the frame header preceding the payload
pub const FRAME_HEADER_SIZE: usize = 5;

/// Margin added to the server timeout before handing the deadline to the
/// channel
///
/// The authority is expected to reply (possibly "unchanged") at or before
/// its own long-poll deadline; the client deadline must never fire first
/// under normal operation, so every dispatch waits this much longer than the
/// server was told to take.
pub const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Current protocol version
pub const CURRENT_PROTOCOL_VERSION: u8 = 2;

/// Protocol version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolVersion(pub u8);

impl ProtocolVersion {
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);

    pub fn current() -> Self {
        Self(CURRENT_PROTOCOL_VERSION)
    }

    /// Exact match required; there is no cross-version compatibility within
    /// one call
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Error codes the authority may set on a reply
///
/// Using explicit u32 values for wire compatibility and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    /// Unknown error
    Unknown = 0,
    /// The authority has no config with the requested name
    UnknownConfig = 1,
    /// The authority does not know the requested definition
    UnknownDefinition = 2,
    /// The requested config name is not legal
    IllegalName = 3,
    /// The authority rejected the request's protocol version
    IllegalVersion = 4,
    /// The requested server timeout was out of range
    IllegalTimeout = 5,
    /// The requested generation floor was out of range
    IllegalGeneration = 6,
    /// Internal error inside the authority
    InternalError = 7,
    /// The authority gave up before producing a reply
    Timeout = 8,
}

impl TryFrom<u32> for ErrorCode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        match value {
            0 => Ok(ErrorCode::Unknown),
            1 => Ok(ErrorCode::UnknownConfig),
            2 => Ok(ErrorCode::UnknownDefinition),
            3 => Ok(ErrorCode::IllegalName),
            4 => Ok(ErrorCode::IllegalVersion),
            5 => Ok(ErrorCode::IllegalTimeout),
            6 => Ok(ErrorCode::IllegalGeneration),
            7 => Ok(ErrorCode::InternalError),
            8 => Ok(ErrorCode::Timeout),
            other => Err(other),
        }
    }
}
