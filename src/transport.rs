//! Transport abstraction for confpoll
//!
//! The protocol core never owns a connection. It hands an opaque encoded
//! payload and a deadline to a [`Channel`] and gets opaque reply bytes back.
//! Connection pooling, reconnects, and TLS all live behind this trait, in
//! whatever transport the host application uses.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

/// Failures originating in the channel rather than the protocol
///
/// These are propagated to the caller untouched; the core attaches no retry
/// or backoff policy.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No reply arrived within the deadline handed to the channel
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying connection closed before a reply arrived
    #[error("connection closed")]
    ConnectionClosed,

    /// Any other transport-level failure
    #[error("transport failure: {0}")]
    Failed(String),

    /// I/O error from the underlying socket
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request-dispatch channel to the configuration authority
///
/// Implementations send one opaque payload and resolve with the opaque reply
/// or a [`TransportError`]. The channel owns timeout enforcement: the
/// deadline passed to [`send`](Channel::send) already includes the
/// client-side margin on top of the server's long-poll timeout, so under
/// normal operation the server replies (possibly "unchanged") before the
/// channel gives up.
///
/// The core never closes or reconfigures the channel; it is shared,
/// externally-owned state. Dropping the future returned by `send` must be
/// safe on the implementation side; the core guarantees a late reply for an
/// abandoned call is discardable because decoding mutates nothing global.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send `payload` and wait up to `timeout` for the reply bytes
    async fn send(&self, payload: Bytes, timeout: Duration) -> Result<Bytes, TransportError>;
}
