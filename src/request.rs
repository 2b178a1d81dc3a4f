//! Versioned request construction and dispatch
//!
//! A [`ConfigRequest`] collects the logical fields of one fetch. Wrapping it
//! in a [`VersionedRequest`] pins the wire version: the same codec that
//! builds the outbound frame parses the reply, so encode-version-A is never
//! mixed with decode-version-B. Version selection is the caller's job;
//! downgrade-on-negotiation-failure lives outside this crate.
//!
//! One request corresponds to exactly one outstanding network call. The
//! request is immutable after construction, holds no response state, and the
//! await inside the channel is the sole suspension point of a fetch.

use std::time::Duration;

use bytes::Bytes;

use crate::error::{ConfigError, Result};
use crate::protocol::codec::{CodecV1, CodecV2, WireCodec};
use crate::protocol::message::RequestPayload;
use crate::protocol::{ProtocolVersion, CLIENT_TIMEOUT_MARGIN};
use crate::response::ConfigResponse;
use crate::trace::Trace;
use crate::transport::Channel;
use crate::types::{Checksum, ConfigKey, Generation};

/// Server-side long-poll timeout used when the caller does not pick one
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// The logical fields of one configuration fetch
///
/// Built once per call and consumed by a versioned wrapper. The trace is
/// carried through the exchange and comes back in the response with
/// authority events appended.
#[derive(Debug, Clone)]
pub struct ConfigRequest {
    /// Identity of the requested configuration unit
    pub key: ConfigKey,
    /// Digest of the content the client already holds; empty on first fetch
    pub last_known_checksum: Checksum,
    /// Generation the client already holds; 0 on first fetch
    pub current_generation: Generation,
    /// Generation floor the client insists on; 0 means "any newer"
    pub wanted_generation: Generation,
    /// Host issuing the request
    pub host_name: String,
    /// How long the authority may hold the request open
    pub server_timeout: Duration,
    /// Diagnostic trace for this exchange
    pub trace: Trace,
}

impl ConfigRequest {
    /// Create a request with no known state (first fetch)
    pub fn new(key: ConfigKey, host_name: impl Into<String>) -> Self {
        Self {
            key,
            last_known_checksum: Checksum::empty(),
            current_generation: 0,
            wanted_generation: 0,
            host_name: host_name.into(),
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            trace: Trace::off(),
        }
    }

    /// Declare the state the client already holds
    pub fn with_last_known(mut self, checksum: Checksum, generation: Generation) -> Self {
        self.last_known_checksum = checksum;
        self.current_generation = generation;
        self
    }

    /// Insist on a generation at or above `floor`
    pub fn with_wanted_generation(mut self, floor: Generation) -> Self {
        self.wanted_generation = floor;
        self
    }

    /// Set the server-side long-poll timeout
    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = timeout;
        self
    }

    /// Attach a trace for this exchange
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Check the caller-provided fields before encoding
    fn validate(&self) -> Result<()> {
        self.key.validate()?;
        if self.host_name.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "empty client host name".to_string(),
            ));
        }
        if self.server_timeout.is_zero() {
            return Err(ConfigError::InvalidRequest(
                "server timeout must be positive".to_string(),
            ));
        }
        // The wire carries the timeout as i64 milliseconds
        if i64::try_from(self.server_timeout.as_millis()).is_err() {
            return Err(ConfigError::InvalidRequest(format!(
                "server timeout out of range: {:?}",
                self.server_timeout
            )));
        }
        if self.current_generation < 0 || self.wanted_generation < 0 {
            return Err(ConfigError::InvalidRequest(format!(
                "negative generation: current {}, wanted {}",
                self.current_generation, self.wanted_generation
            )));
        }
        if self.wanted_generation != 0 && self.wanted_generation < self.current_generation {
            return Err(ConfigError::InvalidRequest(format!(
                "wanted generation {} below current generation {}",
                self.wanted_generation, self.current_generation
            )));
        }
        Ok(())
    }

    fn to_payload(&self) -> RequestPayload {
        RequestPayload {
            def_name: self.key.def_name.clone(),
            def_namespace: self.key.def_namespace.clone(),
            config_id: self.key.config_id.clone(),
            def_md5: self.key.def_md5.clone(),
            config_md5: self.last_known_checksum.clone(),
            current_generation: self.current_generation,
            wanted_generation: self.wanted_generation,
            client_host_name: self.host_name.clone(),
            server_timeout_ms: self.server_timeout.as_millis() as i64,
            trace: self.trace.clone(),
        }
    }
}

/// A request pinned to one wire version
///
/// The closed set of built-in versions is [`ConfigRequestV1`] and
/// [`ConfigRequestV2`]; any [`WireCodec`] implementation can be injected
/// through [`with_codec`](Self::with_codec).
#[derive(Debug, Clone)]
pub struct VersionedRequest<C: WireCodec> {
    request: ConfigRequest,
    codec: C,
}

/// Request speaking protocol version 1
pub type ConfigRequestV1 = VersionedRequest<CodecV1>;

/// Request speaking protocol version 2
pub type ConfigRequestV2 = VersionedRequest<CodecV2>;

impl<C: WireCodec + Default> VersionedRequest<C> {
    /// Pin `request` to this codec's wire version
    pub fn new(request: ConfigRequest) -> Self {
        Self::with_codec(request, C::default())
    }
}

impl<C: WireCodec> VersionedRequest<C> {
    /// Pin `request` to an injected codec
    pub fn with_codec(request: ConfigRequest, codec: C) -> Self {
        Self { request, codec }
    }

    /// The logical request fields
    pub fn request(&self) -> &ConfigRequest {
        &self.request
    }

    /// The wire version this request speaks
    pub fn version(&self) -> ProtocolVersion {
        self.codec.version()
    }

    /// Validate the request fields and encode the outbound frame
    pub fn build(&self) -> Result<Bytes> {
        self.request.validate()?;
        self.codec.encode_request(&self.request.to_payload())
    }

    /// Build the frame and send it over `channel`, returning the raw reply
    ///
    /// The deadline handed to the channel is the server timeout plus
    /// [`CLIENT_TIMEOUT_MARGIN`], so the authority's own long-poll deadline
    /// fires first under normal operation. Dropping the returned future
    /// abandons the call without side effects; decoding a late reply would
    /// mutate nothing.
    pub async fn dispatch(&self, channel: &dyn Channel) -> Result<Bytes> {
        let payload = self.build()?;
        let deadline = self.request.server_timeout + CLIENT_TIMEOUT_MARGIN;
        tracing::debug!(
            "Dispatching {} request for {} (gen {}, wanted {}, deadline {:?})",
            self.version(),
            self.request.key,
            self.request.current_generation,
            self.request.wanted_generation,
            deadline,
        );
        let reply = channel.send(payload, deadline).await?;
        Ok(reply)
    }

    /// Decode and validate a raw reply under this request's version
    pub fn parse_response(&self, reply: &[u8]) -> Result<ConfigResponse> {
        let decoded = self.codec.decode_response(reply).map_err(|e| {
            tracing::warn!(
                "Failed to decode {} reply for {}: {} (trace verbosity {})",
                self.version(),
                self.request.key,
                e,
                self.request.trace.verbosity(),
            );
            e
        })?;
        ConfigResponse::from_decoded(decoded, &self.request).map_err(|e| {
            tracing::warn!(
                "Rejected inconsistent reply for {}: {}",
                self.request.key,
                e
            );
            e
        })
    }

    /// Composed build + dispatch + parse
    pub async fn fetch(&self, channel: &dyn Channel) -> Result<ConfigResponse> {
        let reply = self.dispatch(channel).await?;
        self.parse_response(&reply)
    }
}

/// Fetch `request` over `channel` and return the validated response
///
/// Free-function form of [`VersionedRequest::fetch`].
pub async fn fetch<C: WireCodec>(
    request: &VersionedRequest<C>,
    channel: &dyn Channel,
) -> Result<ConfigResponse> {
    request.fetch(channel).await
}
