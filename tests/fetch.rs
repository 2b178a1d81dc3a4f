//! End-to-end fetch scenarios against an in-process authority
//!
//! The mock authority speaks the real wire format through the codec's
//! server-side half, so these tests exercise the full build → dispatch →
//! parse → validate path of one fetch.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use confpoll::protocol::message::ResponsePayload;
use confpoll::{
    Channel, Checksum, CodecV1, CodecV2, ConfigError, ConfigKey, ConfigRequest, ConfigRequestV2,
    Trace, TransportError, WireCodec,
};

/// Authority state: one config value per mock
struct MockAuthority {
    generation: i64,
    checksum: Checksum,
    payload: Vec<u8>,
    internal_redeploy: bool,
    /// Codec used to answer; normally V2, V1 to fake version skew
    reply_codec: Box<dyn WireCodec>,
}

impl MockAuthority {
    fn new(generation: i64, checksum: &str, payload: &[u8]) -> Self {
        Self {
            generation,
            checksum: Checksum::new(checksum).unwrap(),
            payload: payload.to_vec(),
            internal_redeploy: false,
            reply_codec: Box::new(CodecV2),
        }
    }

    fn replying_with(mut self, codec: impl WireCodec + 'static) -> Self {
        self.reply_codec = Box::new(codec);
        self
    }
}

#[async_trait]
impl Channel for MockAuthority {
    async fn send(&self, payload: Bytes, _timeout: Duration) -> Result<Bytes, TransportError> {
        // Requests always arrive in V2 here; only the reply version varies
        let request = CodecV2
            .decode_request(&payload)
            .map_err(|e| TransportError::Failed(format!("authority rejected request: {}", e)))?;

        let mut trace = request.trace.clone();
        trace.trace(1, "mock authority handled request");

        let changed = self.checksum != request.config_md5;
        let reply = ResponsePayload {
            new_checksum: self.checksum.clone(),
            new_generation: self.generation,
            payload: if changed { self.payload.clone() } else { Vec::new() },
            is_changed: changed,
            is_error: false,
            error_code: 0,
            error_message: String::new(),
            trace,
        };
        let frame = self
            .reply_codec
            .encode_response(&reply, self.internal_redeploy)
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        Ok(frame)
    }
}

/// Channel simulating a network partition: no reply before the deadline
struct PartitionedChannel;

#[async_trait]
impl Channel for PartitionedChannel {
    async fn send(&self, _payload: Bytes, timeout: Duration) -> Result<Bytes, TransportError> {
        Err(TransportError::Timeout(timeout))
    }
}

fn request_with_known_state() -> ConfigRequest {
    ConfigRequest::new(
        ConfigKey::new("search", "vespa.config", "cluster/0"),
        "node1.example.com",
    )
    .with_last_known(
        Checksum::new("abcabcabcabcabcabcabcabcabcabc00").unwrap(),
        5,
    )
    .with_server_timeout(Duration::from_secs(10))
}

// Scenario A: client state matches server state; long-poll expires unchanged
#[tokio::test]
async fn unchanged_long_poll_is_success() {
    let authority = MockAuthority::new(5, "abcabcabcabcabcabcabcabcabcabc00", b"");
    let request = ConfigRequestV2::new(request_with_known_state());

    let response = request.fetch(&authority).await.unwrap();
    assert!(!response.is_changed());
    assert_eq!(response.new_generation(), 5);
    assert_eq!(
        response.new_checksum(),
        &Checksum::new("abcabcabcabcabcabcabcabcabcabc00").unwrap()
    );
    assert!(response.payload().is_empty());
}

// Scenario B: server has moved ahead; client asked for generation >= 6
#[tokio::test]
async fn changed_config_is_delivered() {
    let authority = MockAuthority::new(
        7,
        "12345678123456781234567812345678",
        b"searchers 12\ntimeout 500ms",
    );
    let request = ConfigRequestV2::new(request_with_known_state().with_wanted_generation(6));

    let response = request.fetch(&authority).await.unwrap();
    assert!(response.is_changed());
    assert_eq!(response.new_generation(), 7);
    assert_eq!(
        response.new_checksum(),
        &Checksum::new("12345678123456781234567812345678").unwrap()
    );
    assert_eq!(response.payload().as_ref(), b"searchers 12\ntimeout 500ms");
}

// Scenario C: reply tagged with the wrong version is never turned into a
// response
#[tokio::test]
async fn version_skew_is_a_protocol_mismatch() {
    let authority =
        MockAuthority::new(5, "abcabcabcabcabcabcabcabcabcabc00", b"").replying_with(CodecV1);
    let request = ConfigRequestV2::new(request_with_known_state());

    let err = request.fetch(&authority).await.unwrap_err();
    assert!(matches!(
        err,
        ConfigError::ProtocolMismatch {
            requested: 2,
            replied: 1
        }
    ));
}

// Scenario D: network partition surfaces as a transport error, untouched
#[tokio::test]
async fn partition_surfaces_transport_error() {
    let request = ConfigRequestV2::new(request_with_known_state());
    let err = request.fetch(&PartitionedChannel).await.unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Transport(TransportError::Timeout(_))
    ));
}

#[tokio::test]
async fn server_trace_events_append_to_client_events() {
    let mut trace = Trace::new(3);
    trace.trace(1, "issuing fetch");
    let authority = MockAuthority::new(
        7,
        "12345678123456781234567812345678",
        b"searchers 12",
    );
    let request = ConfigRequestV2::new(request_with_known_state().with_trace(trace));

    let response = request.fetch(&authority).await.unwrap();
    let messages: Vec<&str> = response
        .trace()
        .events()
        .iter()
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["issuing fetch", "mock authority handled request"]
    );
}

#[tokio::test]
async fn internal_redeploy_flag_round_trips() {
    let mut authority = MockAuthority::new(
        8,
        "12345678123456781234567812345678",
        b"searchers 12",
    );
    authority.internal_redeploy = true;
    let request = ConfigRequestV2::new(request_with_known_state());

    let response = request.fetch(&authority).await.unwrap();
    assert!(response.is_changed());
    assert!(response.is_internal_redeploy());
}

#[tokio::test]
async fn first_fetch_with_empty_state_gets_content() {
    let authority = MockAuthority::new(1, "12345678123456781234567812345678", b"initial config");
    let request = ConfigRequestV2::new(ConfigRequest::new(
        ConfigKey::new("search", "vespa.config", "cluster/0"),
        "node1.example.com",
    ));

    let response = request.fetch(&authority).await.unwrap();
    assert!(response.is_changed());
    assert_eq!(response.new_generation(), 1);
    assert_eq!(response.payload().as_ref(), b"initial config");
}

// A late reply for an abandoned call must be safely discardable: parsing is
// pure, so the same raw reply parses identically any number of times
#[tokio::test]
async fn parsing_a_reply_is_idempotent() {
    let authority = MockAuthority::new(
        7,
        "12345678123456781234567812345678",
        b"searchers 12",
    );
    let request = ConfigRequestV2::new(request_with_known_state());

    let raw = request.dispatch(&authority).await.unwrap();
    let first = request.parse_response(&raw).unwrap();
    let second = request.parse_response(&raw).unwrap();
    assert_eq!(first.new_generation(), second.new_generation());
    assert_eq!(first.new_checksum(), second.new_checksum());
    assert_eq!(first.payload(), second.payload());
    assert_eq!(first.is_changed(), second.is_changed());
}

// Independent keys may be fetched concurrently; each call is call-local
#[tokio::test]
async fn concurrent_fetches_for_independent_keys() {
    let authority = MockAuthority::new(3, "12345678123456781234567812345678", b"payload");

    let a = ConfigRequestV2::new(ConfigRequest::new(
        ConfigKey::new("search", "vespa.config", "cluster/0"),
        "node1.example.com",
    ));
    let b = ConfigRequestV2::new(ConfigRequest::new(
        ConfigKey::new("storage", "vespa.config", "cluster/1"),
        "node1.example.com",
    ));

    let (ra, rb) = tokio::join!(a.fetch(&authority), b.fetch(&authority));
    assert!(ra.unwrap().is_changed());
    assert!(rb.unwrap().is_changed());
}
