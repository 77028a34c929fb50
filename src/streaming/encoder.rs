//! Frame encoder.
//!
//! The inverse of [`StreamDecoder`](super::StreamDecoder): renders
//! [`StreamEvent`]s as `event:`/`data:` frames. Useful for producers serving
//! the same vocabulary and for replaying recorded transcripts.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::{Value, json};
use std::pin::Pin;

use crate::defaults;
use crate::error::LlmError;
use crate::types::StreamEvent;

/// Byte stream suitable for an HTTP response body.
pub type FrameByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

#[derive(Debug, Clone)]
pub struct FrameEncoder {
    /// Prefix put in front of a custom event's tag (`data` → `data-<tag>`)
    custom_prefix: String,
    /// Pretty-print payloads, one `data:` line per JSON line
    pretty: bool,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self {
            custom_prefix: "data".to_string(),
            pretty: false,
        }
    }
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.custom_prefix = prefix.into();
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Render one event as a complete frame, blank-line terminator included.
    pub fn encode(&self, event: &StreamEvent) -> String {
        let (name, payload) = match event {
            StreamEvent::TextDelta { text } => ("text-delta".to_string(), json!({ "text": text })),
            StreamEvent::ToolInvoked(record) => (
                "tool-input-available".to_string(),
                json!({ "callId": record.id, "name": record.name, "input": record.input }),
            ),
            StreamEvent::ToolCompleted(result) => (
                "tool-output-available".to_string(),
                json!({ "callId": result.call_id, "output": result.output }),
            ),
            StreamEvent::Finished {
                finish_reason,
                usage,
            } => {
                let mut body = serde_json::Map::new();
                if let Some(reason) = finish_reason {
                    body.insert("finishReason".into(), Value::String(reason.clone()));
                }
                if let Some(usage) = usage {
                    body.insert("usage".into(), json!(usage));
                }
                ("finish-message".to_string(), Value::Object(body))
            }
            StreamEvent::Failed { message } => ("error".to_string(), json!({ "message": message })),
            StreamEvent::Custom(custom) => (
                format!("{}-{}", self.custom_prefix, custom.tag),
                custom.payload.clone(),
            ),
        };
        self.frame(&name, &payload)
    }

    /// The end-of-stream sentinel frame.
    pub fn encode_done(&self) -> String {
        format!("data: {}\n\n", defaults::decoder::DONE_MARKER)
    }

    fn frame(&self, name: &str, payload: &Value) -> String {
        let body = if self.pretty {
            serde_json::to_string_pretty(payload)
        } else {
            serde_json::to_string(payload)
        }
        .unwrap_or_else(|_| "null".to_string());

        let mut out = format!("event: {name}\n");
        for line in body.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}

/// Encode an event stream into frame bytes, closing with the `[DONE]` sentinel.
pub fn encode_event_stream<S>(stream: S, encoder: FrameEncoder) -> FrameByteStream
where
    S: Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static,
{
    let done = Bytes::from(encoder.encode_done());
    let frames = stream.map(move |item| item.map(|event| Bytes::from(encoder.encode(&event))));
    Box::pin(frames.chain(futures_util::stream::once(async move { Ok(done) })))
}
