//! Wire payload definitions
//!
//! The logical request/response model is fixed across protocol versions;
//! only the envelope differs. Version 1 frames these structs directly.
//! Version 2 wraps them in a tagged envelope that repeats the protocol
//! version inside the payload (so a reply routed through a version-oblivious
//! relay can still be checked) and adds the internal-redeploy flag.

use serde::{Deserialize, Serialize};

use crate::trace::Trace;
use crate::types::{Checksum, ConfigKey, Generation};

/// Request fields as transmitted to the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
    /// Name of the requested config definition
    pub def_name: String,
    /// Namespace of the definition
    pub def_namespace: String,
    /// Requesting consumer's config id
    pub config_id: String,
    /// Definition schema digest, when the client knows it
    pub def_md5: Option<Checksum>,
    /// Digest of the config content the client already holds
    pub config_md5: Checksum,
    /// Generation the client already holds
    pub current_generation: Generation,
    /// Generation floor the client insists on; 0 means "any newer"
    pub wanted_generation: Generation,
    /// Host issuing the request, for authority-side bookkeeping
    pub client_host_name: String,
    /// How long the authority may hold the request open
    pub server_timeout_ms: i64,
    /// Client-side trace events plus verbosity threshold
    pub trace: Trace,
}

impl RequestPayload {
    /// Reassemble the config key this payload was built from
    pub fn key(&self) -> ConfigKey {
        let key = ConfigKey::new(
            self.def_name.clone(),
            self.def_namespace.clone(),
            self.config_id.clone(),
        );
        match &self.def_md5 {
            Some(md5) => key.with_def_md5(md5.clone()),
            None => key,
        }
    }
}

/// Response fields as returned by the authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    /// Digest of the authority's current config content
    pub new_checksum: Checksum,
    /// The authority's current generation
    pub new_generation: Generation,
    /// Serialized config content; non-empty only when changed
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
    /// Whether the content differs from what the request declared
    pub is_changed: bool,
    /// Whether the authority failed to serve the request
    pub is_error: bool,
    /// Authority error code, meaningful only when `is_error`
    pub error_code: u32,
    /// Authority error message, meaningful only when `is_error`
    pub error_message: String,
    /// The request's trace with authority events appended
    pub trace: Trace,
}

/// Version 2 request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRequest {
    /// Embedded protocol version; must agree with the frame byte
    pub version: u8,
    pub body: RequestPayload,
}

/// Version 2 response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedResponse {
    /// Embedded protocol version; must agree with the version the request
    /// was built with
    pub version: u8,
    /// Authority asks the client to apply the value immediately instead of
    /// waiting for its normal activation point
    pub internal_redeploy: bool,
    pub body: ResponsePayload,
}
