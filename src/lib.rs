//! # confpoll
//!
//! Versioned request/response protocol for fetching configuration from a
//! remote authority and efficiently detecting change.
//!
//! A client names a configuration unit ([`ConfigKey`]), declares the
//! checksum and generation it already holds, and dispatches a versioned
//! request over an opaque [`Channel`]. The authority may hold the request
//! open (long-poll) until a newer generation exists or its timeout elapses,
//! then replies either way; an "unchanged, timed out" reply is success. The
//! reply is decoded with the same codec that built the request and validated
//! for internal consistency before the caller ever sees it.
//!
//! This crate is the protocol layer only. Transport, connection management,
//! retry policy, version negotiation, and config storage live outside.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use confpoll::{Channel, ConfigKey, ConfigRequest, ConfigRequestV2, Trace};
//!
//! async fn poll(channel: &dyn Channel) -> confpoll::Result<()> {
//!     let key = ConfigKey::new("search", "vespa.config", "cluster/0");
//!     let request = ConfigRequest::new(key, "node1.example.com")
//!         .with_wanted_generation(0)
//!         .with_trace(Trace::new(3));
//!
//!     let response = ConfigRequestV2::new(request).fetch(channel).await?;
//!     if response.is_changed() {
//!         println!(
//!             "new generation {} ({} bytes)",
//!             response.new_generation(),
//!             response.payload().len()
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Each fetch is call-local: no shared mutable state exists between calls,
//! so independent keys may be fetched concurrently without locks.

pub mod error;
pub mod protocol;
pub mod request;
pub mod response;
pub mod trace;
pub mod transport;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{ConfigError, Result};
pub use protocol::{
    CodecV1, CodecV2, ErrorCode, ProtocolVersion, WireCodec, CLIENT_TIMEOUT_MARGIN,
    CURRENT_PROTOCOL_VERSION,
};
pub use request::{fetch, ConfigRequest, ConfigRequestV1, ConfigRequestV2, VersionedRequest};
pub use response::ConfigResponse;
pub use trace::{Trace, TraceEvent};
pub use transport::{Channel, TransportError};
pub use types::{Checksum, ConfigKey, Generation};
