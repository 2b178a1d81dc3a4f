//! Versioned encode/decode of protocol frames
//!
//! A [`WireCodec`] turns logical request/response payloads into framed bytes
//! and back, for exactly one protocol version. Both directions are provided:
//! clients encode requests and decode responses, while golden protocol tests
//! and test authorities need the opposite pair as well.
//!
//! Encoding is byte-for-byte reproducible for identical input. A request
//! built with one codec must be parsed with the same codec; the core never
//! mixes versions within a call.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{ConfigError, Result};
use crate::protocol::message::{RequestPayload, ResponsePayload, TaggedRequest, TaggedResponse};
use crate::protocol::{ProtocolVersion, FRAME_HEADER_SIZE, MAX_FRAME_SIZE, MIN_FRAME_SIZE};

/// A reply decoded from the wire but not yet validated
///
/// Only [`ConfigResponse::from_decoded`](crate::ConfigResponse) can turn
/// this into a caller-visible response, which keeps unvalidated replies from
/// escaping the crate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedReply {
    /// Version the reply was decoded under
    pub version: ProtocolVersion,
    /// Apply-immediately flag; always false under version 1
    pub internal_redeploy: bool,
    /// The logical response fields
    pub body: ResponsePayload,
}

/// Versioned wire codec
///
/// Implemented by the closed set of built-in versions ([`CodecV1`],
/// [`CodecV2`]); kept as a trait so a host can inject its own codec for the
/// same logical model.
pub trait WireCodec: Send + Sync {
    /// The protocol version this codec speaks
    fn version(&self) -> ProtocolVersion;

    /// Encode a request into a framed payload
    fn encode_request(&self, payload: &RequestPayload) -> Result<Bytes>;

    /// Decode a framed request (authority side, used by protocol tests)
    fn decode_request(&self, frame: &[u8]) -> Result<RequestPayload>;

    /// Encode a response into a framed payload (authority side)
    fn encode_response(&self, payload: &ResponsePayload, internal_redeploy: bool)
        -> Result<Bytes>;

    /// Decode a framed response
    fn decode_response(&self, frame: &[u8]) -> Result<DecodedReply>;
}

/// Wrap a serialized payload in the length/version frame header
fn seal_frame(version: ProtocolVersion, payload: Vec<u8>) -> Result<Bytes> {
    let length = 1 + payload.len();
    if length > MAX_FRAME_SIZE {
        return Err(ConfigError::decode(
            version.0,
            format!("frame too large: {} bytes (max {})", length, MAX_FRAME_SIZE),
        ));
    }
    let mut frame = BytesMut::with_capacity(4 + length);
    frame.put_u32(length as u32);
    frame.put_u8(version.0);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

/// Strip and check the frame header, returning the inner payload bytes
///
/// The channel is message-oriented, so the frame must be exact: a length
/// prefix that disagrees with the actual byte count is malformed, not a
/// partial read.
fn open_frame(expected: ProtocolVersion, frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(ConfigError::decode(
            expected.0,
            format!("frame truncated: {} bytes", frame.len()),
        ));
    }
    let length = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(ConfigError::decode(
            expected.0,
            format!("frame too large: {} bytes (max {})", length, MAX_FRAME_SIZE),
        ));
    }
    if length != frame.len() - 4 {
        return Err(ConfigError::decode(
            expected.0,
            format!(
                "frame length mismatch: header says {}, got {}",
                length,
                frame.len() - 4
            ),
        ));
    }
    let version = frame[4];
    if version != expected.0 {
        return Err(ConfigError::ProtocolMismatch {
            requested: expected.0,
            replied: version,
        });
    }
    Ok(&frame[FRAME_HEADER_SIZE..])
}

fn deserialize<T: serde::de::DeserializeOwned>(version: ProtocolVersion, bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| ConfigError::decode(version.0, e.to_string()))
}

fn serialize<T: serde::Serialize>(version: ProtocolVersion, value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ConfigError::decode(version.0, e.to_string()))
}

/// Version 1 codec: bare payloads, no embedded tag, no redeploy flag
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecV1;

impl WireCodec for CodecV1 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V1
    }

    fn encode_request(&self, payload: &RequestPayload) -> Result<Bytes> {
        seal_frame(self.version(), serialize(self.version(), payload)?)
    }

    fn decode_request(&self, frame: &[u8]) -> Result<RequestPayload> {
        let inner = open_frame(self.version(), frame)?;
        deserialize(self.version(), inner)
    }

    fn encode_response(
        &self,
        payload: &ResponsePayload,
        _internal_redeploy: bool,
    ) -> Result<Bytes> {
        // Version 1 cannot express the redeploy flag; it is dropped.
        seal_frame(self.version(), serialize(self.version(), payload)?)
    }

    fn decode_response(&self, frame: &[u8]) -> Result<DecodedReply> {
        let inner = open_frame(self.version(), frame)?;
        let body: ResponsePayload = deserialize(self.version(), inner)?;
        Ok(DecodedReply {
            version: self.version(),
            internal_redeploy: false,
            body,
        })
    }
}

/// Version 2 codec: tagged envelopes carrying the version inside the
/// payload, plus the internal-redeploy flag on responses
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecV2;

impl WireCodec for CodecV2 {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn encode_request(&self, payload: &RequestPayload) -> Result<Bytes> {
        let tagged = TaggedRequest {
            version: self.version().0,
            body: payload.clone(),
        };
        seal_frame(self.version(), serialize(self.version(), &tagged)?)
    }

    fn decode_request(&self, frame: &[u8]) -> Result<RequestPayload> {
        let inner = open_frame(self.version(), frame)?;
        let tagged: TaggedRequest = deserialize(self.version(), inner)?;
        if tagged.version != self.version().0 {
            return Err(ConfigError::ProtocolMismatch {
                requested: self.version().0,
                replied: tagged.version,
            });
        }
        Ok(tagged.body)
    }

    fn encode_response(&self, payload: &ResponsePayload, internal_redeploy: bool) -> Result<Bytes> {
        let tagged = TaggedResponse {
            version: self.version().0,
            internal_redeploy,
            body: payload.clone(),
        };
        seal_frame(self.version(), serialize(self.version(), &tagged)?)
    }

    fn decode_response(&self, frame: &[u8]) -> Result<DecodedReply> {
        let inner = open_frame(self.version(), frame)?;
        let tagged: TaggedResponse = deserialize(self.version(), inner)?;
        if tagged.version != self.version().0 {
            return Err(ConfigError::ProtocolMismatch {
                requested: self.version().0,
                replied: tagged.version,
            });
        }
        Ok(DecodedReply {
            version: self.version(),
            internal_redeploy: tagged.internal_redeploy,
            body: tagged.body,
        })
    }
}
