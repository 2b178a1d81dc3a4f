//! End-to-end diagnostic trace for one request/response exchange
//!
//! A [`Trace`] rides along with a single fetch: the client records events up
//! to its verbosity threshold, the authority appends its own events while
//! handling the request, and the whole log comes back in the response. The
//! log is append-only; existing events are never reordered or dropped.
//!
//! The trace is explicitly passed, not thread-local, so it survives the
//! suspension between dispatch and reply without any ambient state.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One entry in a trace log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Milliseconds since the Unix epoch, recorded when the event was added
    pub timestamp_ms: i64,
    /// Verbosity level the event was recorded at
    pub level: i32,
    /// Human-readable message
    pub message: String,
}

/// Ordered, appendable event log with a verbosity threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    verbosity: i32,
    events: Vec<TraceEvent>,
}

impl Trace {
    /// Create a trace recording events up to `verbosity`
    pub fn new(verbosity: i32) -> Self {
        Self {
            verbosity,
            events: Vec::new(),
        }
    }

    /// A trace that records nothing
    pub fn off() -> Self {
        Self::new(0)
    }

    /// Check whether an event at `level` would be recorded
    pub fn should_trace(&self, level: i32) -> bool {
        level > 0 && level <= self.verbosity
    }

    /// Append an event at `level`
    ///
    /// Returns whether the event was recorded. Events above the verbosity
    /// threshold are dropped without side effects.
    pub fn trace(&mut self, level: i32, message: impl Into<String>) -> bool {
        if !self.should_trace(level) {
            return false;
        }
        self.events.push(TraceEvent {
            timestamp_ms: Utc::now().timestamp_millis(),
            level,
            message: message.into(),
        });
        true
    }

    /// The verbosity threshold
    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    /// All recorded events, in append order
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Check that every event of `older` survives in this trace, as a prefix
    /// and in its original order
    ///
    /// Used to verify that the authority only appended to the client's log.
    pub fn preserves(&self, older: &Trace) -> bool {
        self.events.len() >= older.events.len()
            && self.events[..older.events.len()] == older.events[..]
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::off()
    }
}
