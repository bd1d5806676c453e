//! Server-sent-event framing for the streaming result surface.
//!
//! The streaming variant of an invocation yields SSE-formatted text chunks.
//! An orchestration produces exactly one terminal chunk: the aggregated
//! result on success, or an error-shaped chunk on failure. The payload is a
//! JSON object with `content` and `type` fields.

use futures::stream::{self, Iter};
use serde::{Deserialize, Serialize};

/// Payload type carried by a streamed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrchestrationResult,
    Error,
}

/// One streamed event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SseEvent {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl SseEvent {
    pub fn result(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: EventKind::OrchestrationResult,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: EventKind::Error,
        }
    }

    /// Render the event as an SSE `data:` frame.
    pub fn frame(&self) -> String {
        let payload = serde_json::json!({
            "content": self.content,
            "type": self.kind,
        });
        format!("data: {}\n\n", payload)
    }
}

/// Stream of framed chunks for one invocation outcome.
pub type ResultStream = Iter<std::vec::IntoIter<String>>;

/// Build the single-chunk stream for a finished invocation.
pub fn result_stream(event: SseEvent) -> ResultStream {
    stream::iter(vec![event.frame()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_result_frame_shape() {
        let frame = SseEvent::result("all done").frame();
        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));

        let payload: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(payload["content"], "all done");
        assert_eq!(payload["type"], "orchestration_result");
    }

    #[test]
    fn test_error_frame_kind() {
        let frame = SseEvent::error("boom").frame();
        let payload: serde_json::Value =
            serde_json::from_str(frame.trim_start_matches("data: ").trim()).unwrap();
        assert_eq!(payload["type"], "error");
    }

    #[test]
    fn test_event_round_trip() {
        let event = SseEvent::result("text");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: SseEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[tokio::test]
    async fn test_stream_yields_exactly_one_chunk() {
        let chunks: Vec<String> = result_stream(SseEvent::result("done")).collect().await;
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("orchestration_result"));
    }
}
