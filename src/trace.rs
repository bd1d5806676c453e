//! Distributed-trace context propagation.
//!
//! Callers that already run under a distributed trace can pass a carrier
//! mapping; the crate records it on the invoke span and forwards it as
//! headers on delegated calls. No parsing or validation of the W3C format is
//! done here, only presence checks.

use std::collections::HashMap;

/// Carrier key for the W3C trace parent header.
pub const TRACEPARENT: &str = "traceparent";
/// Carrier key for the W3C trace state header.
pub const TRACESTATE: &str = "tracestate";

/// Externally supplied trace context scoping a remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceContext {
    pub traceparent: String,
    pub tracestate: Option<String>,
}

impl TraceContext {
    pub fn new(traceparent: impl Into<String>) -> Self {
        Self {
            traceparent: traceparent.into(),
            tracestate: None,
        }
    }

    /// Extract a trace context from a carrier mapping.
    ///
    /// Returns `None` when the carrier has no `traceparent` entry, in which
    /// case the call proceeds untraced.
    pub fn from_carrier(carrier: &HashMap<String, String>) -> Option<Self> {
        let traceparent = carrier.get(TRACEPARENT)?.clone();
        Some(Self {
            traceparent,
            tracestate: carrier.get(TRACESTATE).cloned(),
        })
    }

    /// Header pairs to forward on delegated HTTP calls.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![(TRACEPARENT, self.traceparent.clone())];
        if let Some(state) = &self.tracestate {
            headers.push((TRACESTATE, state.clone()));
        }
        headers
    }

    /// Record the context on the current tracing span.
    ///
    /// The span must declare a `traceparent` field (typically via
    /// `fields(traceparent = tracing::field::Empty)`).
    pub fn record_on(&self, span: &tracing::Span) {
        span.record("traceparent", self.traceparent.as_str());
    }
}
