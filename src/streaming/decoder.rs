//! Stream Decoder
//!
//! Transport-agnostic state machine that turns text fragments into
//! [`StreamEvent`]s. It keeps the running transcript (accumulated text and
//! tool calls) so callers can inspect it at any point, mid-stream included.
//!
//! The decoder never fails across its public surface: a frame it cannot make
//! sense of is logged under the `uistream::decoder` target and dropped, and
//! decoding carries on with the next frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::DecoderConfig;
use super::frame::{FrameAssembler, SseFrame};
use super::ledger::{Completion, ToolCallLedger};
use crate::types::{
    CustomEvent, StreamEvent, ToolCallRecord, ToolPart, ToolResult, Usage,
};

/// Counters kept across one decoding session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    /// Frames handed over by the assembler
    pub frames: u64,
    /// Events emitted
    pub events: u64,
    /// Frames dropped because their payload could not be parsed
    pub dropped_frames: u64,
    /// Tool records created from an output whose input was never seen
    pub synthesized_tool_calls: u64,
}

/// Owned copy of the decoder's transcript state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecoderSnapshot {
    pub accumulated_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_parts: Vec<ToolPart>,
    pub stats: DecoderStats,
}

/// Incremental decoder for the UI message stream vocabulary.
///
/// # Example
///
/// ```rust,ignore
/// use uistream::streaming::StreamDecoder;
///
/// let mut decoder = StreamDecoder::new();
/// let mut events = Vec::new();
/// decoder.feed("event: text-delta\ndata: {\"te", |e| events.push(e));
/// decoder.feed("xt\":\"Hi\"}\n\n", |e| events.push(e));
/// decoder.flush(|e| events.push(e));
/// assert_eq!(decoder.accumulated_text(), "Hi");
/// ```
#[derive(Debug, Default)]
pub struct StreamDecoder {
    config: DecoderConfig,
    frames: FrameAssembler,
    state: DecoderState,
}

#[derive(Debug, Default)]
struct DecoderState {
    accumulated_text: String,
    tool_calls: ToolCallLedger,
    stats: DecoderStats,
}

/// What a frame's event name selects.
#[derive(Debug, PartialEq, Eq)]
enum FrameKind {
    TextDelta,
    ToolInput,
    ToolOutput,
    Finish,
    Error,
    Custom(String),
    /// Lifecycle marker, consumed silently
    Ignored,
    /// No recognizable name (e.g. the SSE default `message`)
    Unrecognized,
}

impl FrameKind {
    fn classify(name: &str, config: &DecoderConfig) -> Self {
        match name {
            "text-delta" => Self::TextDelta,
            "tool-input-available" => Self::ToolInput,
            "tool-output-available" => Self::ToolOutput,
            "finish-message" | "finish" => Self::Finish,
            "error" => Self::Error,
            _ if config.is_ignored(name) => Self::Ignored,
            _ => match name.split_once('-') {
                Some((prefix, tag)) if !prefix.is_empty() && !tag.is_empty() => {
                    Self::Custom(tag.to_string())
                }
                _ => Self::Unrecognized,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextDeltaPayload {
    #[serde(alias = "delta")]
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolInputPayload {
    #[serde(alias = "toolCallId")]
    call_id: String,
    #[serde(alias = "toolName")]
    name: String,
    #[serde(default)]
    input: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolOutputPayload {
    #[serde(alias = "toolCallId")]
    call_id: String,
    #[serde(default)]
    output: Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FinishPayload {
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Feed a text fragment of any length. Events for every frame completed
    /// by this fragment are passed to `emit` in order before this returns.
    pub fn feed<F>(&mut self, chunk: &str, mut emit: F)
    where
        F: FnMut(StreamEvent),
    {
        let Self {
            config,
            frames,
            state,
        } = self;
        frames.push(chunk, |frame| state.dispatch(config, frame, &mut emit));
    }

    /// Treat end of input as a line terminator followed by a blank line.
    ///
    /// Calling it again without feeding more input emits nothing.
    pub fn flush<F>(&mut self, mut emit: F)
    where
        F: FnMut(StreamEvent),
    {
        let Self {
            config,
            frames,
            state,
        } = self;
        frames.finish(|frame| state.dispatch(config, frame, &mut emit));
    }

    /// [`feed`](Self::feed) into a fresh vector.
    pub fn feed_collect(&mut self, chunk: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.feed(chunk, |e| events.push(e));
        events
    }

    /// [`flush`](Self::flush) into a fresh vector.
    pub fn flush_collect(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.flush(|e| events.push(e));
        events
    }

    /// Forget everything, ready for an unrelated stream. Configuration is kept.
    pub fn reset(&mut self) {
        self.frames.reset();
        self.state = DecoderState::default();
    }

    /// Every text delta so far, concatenated in arrival order.
    pub fn accumulated_text(&self) -> &str {
        &self.state.accumulated_text
    }

    /// Tool call records in arrival order.
    pub fn tool_calls(&self) -> Vec<ToolCallRecord> {
        self.state.tool_calls.records()
    }

    pub fn tool_call(&self, call_id: &str) -> Option<&ToolCallRecord> {
        self.state.tool_calls.get(call_id)
    }

    /// Transcript view of the tool calls.
    pub fn tool_parts(&self) -> Vec<ToolPart> {
        self.state.tool_calls.parts()
    }

    pub fn ledger(&self) -> &ToolCallLedger {
        &self.state.tool_calls
    }

    pub fn stats(&self) -> DecoderStats {
        self.state.stats
    }

    /// Whether input is buffered that `flush` would still resolve.
    pub fn has_pending_input(&self) -> bool {
        !self.frames.pending_line().is_empty() || self.frames.has_pending_frame()
    }

    pub fn snapshot(&self) -> DecoderSnapshot {
        DecoderSnapshot {
            accumulated_text: self.state.accumulated_text.clone(),
            tool_calls: self.tool_calls(),
            tool_parts: self.tool_parts(),
            stats: self.state.stats,
        }
    }
}

impl DecoderState {
    fn dispatch<F>(&mut self, config: &DecoderConfig, frame: SseFrame, emit: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        self.stats.frames += 1;

        // Not JSON, so it has to be matched before any parsing
        if config.is_done_marker(&frame.data) {
            self.emit(StreamEvent::done(), emit);
            return;
        }

        let SseFrame { event, data } = frame;
        let mut body = None;
        let name = match event.filter(|n| !n.is_empty()) {
            Some(name) => name,
            None if config.infer_type_from_body && !data.trim().is_empty() => {
                match serde_json::from_str::<Value>(&data) {
                    Ok(value) => {
                        let name = value
                            .get("type")
                            .and_then(Value::as_str)
                            .unwrap_or("message")
                            .to_string();
                        body = Some(value);
                        name
                    }
                    Err(e) => {
                        self.drop_frame("message", &e);
                        return;
                    }
                }
            }
            None => "message".to_string(),
        };

        let kind = FrameKind::classify(&name, config);
        match kind {
            FrameKind::Ignored => {
                tracing::trace!(target: "uistream::decoder", event = %name, "lifecycle marker");
                return;
            }
            FrameKind::Unrecognized => {
                tracing::debug!(target: "uistream::decoder", event = %name, "ignoring unrecognized frame");
                return;
            }
            _ => {}
        }

        let payload = match body {
            Some(value) => value,
            None if data.trim().is_empty() => Value::Null,
            None => match serde_json::from_str::<Value>(&data) {
                Ok(value) => value,
                Err(e) => {
                    self.drop_frame(&name, &e);
                    return;
                }
            },
        };

        match kind {
            FrameKind::TextDelta => match serde_json::from_value::<TextDeltaPayload>(payload) {
                Ok(p) => {
                    self.accumulated_text.push_str(&p.text);
                    self.emit(StreamEvent::TextDelta { text: p.text }, emit);
                }
                Err(e) => self.drop_frame(&name, &e),
            },
            FrameKind::ToolInput => match serde_json::from_value::<ToolInputPayload>(payload) {
                Ok(p) => {
                    tracing::debug!(
                        target: "uistream::decoder",
                        call_id = %p.call_id,
                        tool = %p.name,
                        "tool invoked"
                    );
                    let record = ToolCallRecord::invoked(p.call_id, p.name, p.input);
                    let record = self.tool_calls.invoke(record).clone();
                    self.emit(StreamEvent::ToolInvoked(record), emit);
                }
                Err(e) => self.drop_frame(&name, &e),
            },
            FrameKind::ToolOutput => match serde_json::from_value::<ToolOutputPayload>(payload) {
                Ok(p) => {
                    let (_, completion) = self.tool_calls.complete(&p.call_id, p.output.clone());
                    if completion == Completion::Synthesized {
                        self.stats.synthesized_tool_calls += 1;
                        tracing::warn!(
                            target: "uistream::decoder",
                            call_id = %p.call_id,
                            "tool output for unknown call id; synthesized record"
                        );
                    }
                    self.emit(
                        StreamEvent::ToolCompleted(ToolResult {
                            call_id: p.call_id,
                            output: p.output,
                        }),
                        emit,
                    );
                }
                Err(e) => self.drop_frame(&name, &e),
            },
            FrameKind::Finish => {
                let parsed = match payload {
                    Value::Null => Ok(FinishPayload::default()),
                    other => serde_json::from_value::<FinishPayload>(other),
                };
                match parsed {
                    Ok(p) => self.emit(
                        StreamEvent::Finished {
                            finish_reason: p.finish_reason,
                            usage: p.usage,
                        },
                        emit,
                    ),
                    Err(e) => self.drop_frame(&name, &e),
                }
            }
            FrameKind::Error => {
                let message = error_message(payload);
                tracing::debug!(target: "uistream::decoder", message = %message, "error frame");
                self.emit(StreamEvent::Failed { message }, emit);
            }
            FrameKind::Custom(tag) => {
                self.emit(StreamEvent::Custom(CustomEvent { tag, payload }), emit);
            }
            FrameKind::Ignored | FrameKind::Unrecognized => {}
        }
    }

    fn emit<F>(&mut self, event: StreamEvent, emit: &mut F)
    where
        F: FnMut(StreamEvent),
    {
        self.stats.events += 1;
        emit(event);
    }

    fn drop_frame(&mut self, event: &str, reason: &dyn std::fmt::Display) {
        self.stats.dropped_frames += 1;
        tracing::warn!(
            target: "uistream::decoder",
            event = %event,
            error = %reason,
            "dropping malformed frame"
        );
    }
}

/// Message of an `error` frame: `{ message }`, `{ errorText }`, or a bare string.
fn error_message(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        Value::Null => "unknown error".to_string(),
        Value::Object(ref obj) => obj
            .get("message")
            .or_else(|| obj.get("errorText"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallState;
    use serde_json::json;
    use tracing_test::traced_test;

    fn decode_all(chunks: &[&str]) -> (StreamDecoder, Vec<StreamEvent>) {
        let mut decoder = StreamDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            decoder.feed(chunk, |e| events.push(e));
        }
        decoder.flush(|e| events.push(e));
        (decoder, events)
    }

    #[test]
    fn text_deltas_accumulate() {
        let (decoder, events) = decode_all(&[
            "event: text-delta\ndata: {\"text\":\"He\"}\n\nevent: text-delta\ndata: {\"text\":\"llo\"}\n\n",
        ]);
        assert_eq!(
            events,
            vec![StreamEvent::text("He"), StreamEvent::text("llo")]
        );
        assert_eq!(decoder.accumulated_text(), "Hello");
    }

    #[test]
    fn payload_split_inside_json_token() {
        let (_, split) = decode_all(&["event: text-delta\ndata: {\"te", "xt\":\"Hi\"}\n\n"]);
        let (_, whole) = decode_all(&["event: text-delta\ndata: {\"text\":\"Hi\"}\n\n"]);
        assert_eq!(split, vec![StreamEvent::text("Hi")]);
        assert_eq!(split, whole);
    }

    #[test]
    fn tool_lifecycle_completes_record() {
        let (decoder, events) = decode_all(&[
            "event: tool-input-available\ndata: {\"callId\":\"c1\",\"name\":\"lookup\",\"input\":{}}\n\n",
            "event: tool-output-available\ndata: {\"callId\":\"c1\",\"output\":{\"ok\":true}}\n\n",
        ]);

        assert!(matches!(&events[0], StreamEvent::ToolInvoked(r) if r.id == "c1" && r.state == ToolCallState::Invoked));
        assert_eq!(
            events[1],
            StreamEvent::ToolCompleted(ToolResult {
                call_id: "c1".into(),
                output: json!({"ok": true}),
            })
        );

        let calls = decoder.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].state, ToolCallState::Completed);
        assert_eq!(calls[0].output, Some(json!({"ok": true})));
        assert!(!calls[0].synthesized);
        assert_eq!(decoder.tool_parts()[0].state, ToolCallState::Completed);
    }

    #[test]
    fn done_sentinel_finishes_without_usage() {
        for input in ["data: [DONE]\n\n", "event: finish-message\ndata: [DONE]\n\n"] {
            let (_, events) = decode_all(&[input]);
            assert_eq!(events, vec![StreamEvent::done()], "input: {input:?}");
        }
    }

    #[test]
    fn finish_message_carries_usage_and_reason() {
        let (_, events) = decode_all(&[
            "event: finish-message\ndata: {\"finishReason\":\"stop\",\"usage\":{\"promptTokens\":5,\"completionTokens\":2,\"totalTokens\":7}}\n\n",
        ]);
        assert_eq!(
            events,
            vec![StreamEvent::Finished {
                finish_reason: Some("stop".into()),
                usage: Some(Usage::new(5, 2)),
            }]
        );
    }

    #[test]
    fn finish_does_not_stop_decoding() {
        let (decoder, events) = decode_all(&[
            "event: finish-message\ndata: {}\n\nevent: text-delta\ndata: {\"text\":\"late\"}\n\n",
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(decoder.accumulated_text(), "late");
    }

    #[test]
    fn empty_text_delta_is_still_emitted() {
        let (_, events) = decode_all(&["event: text-delta\ndata: {\"text\":\"\"}\n\n"]);
        assert_eq!(events, vec![StreamEvent::text("")]);
    }

    #[test]
    fn error_frames_accept_object_or_bare_string() {
        let (_, events) = decode_all(&[
            "event: error\ndata: {\"message\":\"quota\"}\n\n",
            "event: error\ndata: \"bare\"\n\n",
            "event: error\ndata: {\"errorText\":\"vercel\"}\n\n",
        ]);
        assert_eq!(
            events,
            vec![
                StreamEvent::failed("quota"),
                StreamEvent::failed("bare"),
                StreamEvent::failed("vercel"),
            ]
        );
    }

    #[test]
    fn custom_frames_pass_payload_through() {
        let (_, events) = decode_all(&["event: data-trace\ndata: {\"step\":[1,2]}\n\n"]);
        assert_eq!(
            events,
            vec![StreamEvent::Custom(CustomEvent {
                tag: "trace".into(),
                payload: json!({"step": [1, 2]}),
            })]
        );
    }

    #[test]
    fn lifecycle_markers_emit_nothing() {
        let (decoder, events) = decode_all(&[
            "event: start-step\ndata: {}\n\nevent: text-start\ndata: {\"id\":\"t\"}\n\nevent: finish-step\n\n",
        ]);
        assert!(events.is_empty());
        assert_eq!(decoder.stats().frames, 3);
    }

    #[traced_test]
    #[test]
    fn malformed_frame_is_dropped_and_logged() {
        let (decoder, events) = decode_all(&[
            "event: text-delta\ndata: {\"text\":\"a\"}\n\n",
            "event: text-delta\ndata: {\"text\":\n\n",
            "event: text-delta\ndata: {\"text\":\"b\"}\n\n",
        ]);
        assert_eq!(events, vec![StreamEvent::text("a"), StreamEvent::text("b")]);
        assert_eq!(decoder.stats().dropped_frames, 1);
        assert!(logs_contain("dropping malformed frame"));
    }

    #[test]
    fn payload_missing_required_field_is_dropped() {
        let (decoder, events) = decode_all(&[
            "event: tool-input-available\ndata: {\"name\":\"lookup\"}\n\n",
        ]);
        assert!(events.is_empty());
        assert!(decoder.tool_calls().is_empty());
        assert_eq!(decoder.stats().dropped_frames, 1);
    }

    #[traced_test]
    #[test]
    fn output_for_unknown_call_is_synthesized() {
        let (decoder, events) = decode_all(&[
            "event: tool-output-available\ndata: {\"callId\":\"ghost\",\"output\":1}\n\n",
        ]);
        assert_eq!(events.len(), 1);
        let record = decoder.tool_call("ghost").expect("synthesized record");
        assert!(record.synthesized);
        assert_eq!(record.name, crate::types::UNKNOWN_TOOL_NAME);
        assert_eq!(record.state, ToolCallState::Completed);
        assert_eq!(decoder.stats().synthesized_tool_calls, 1);
        assert!(logs_contain("synthesized record"));
    }

    #[test]
    fn multi_line_data_is_joined_before_parsing() {
        let (decoder, _) = decode_all(&[
            "event: text-delta\ndata: {\n",
            "data: \"text\": \"line\\nbreak\"\n",
            "data: }\n\n",
        ]);
        assert_eq!(decoder.accumulated_text(), "line\nbreak");
    }

    #[test]
    fn type_field_selects_kind_without_event_line() {
        let (decoder, events) = decode_all(&[
            "data: {\"type\":\"text-delta\",\"delta\":\"x\",\"id\":\"0\"}\n\n",
            "data: {\"type\":\"tool-input-available\",\"toolCallId\":\"t\",\"toolName\":\"n\",\"input\":{}}\n\n",
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(decoder.accumulated_text(), "x");
        assert_eq!(decoder.tool_calls()[0].name, "n");
    }

    #[test]
    fn flush_dispatches_unterminated_frame_once() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder
            .feed_collect("event: text-delta\ndata: {\"text\":\"tail\"}")
            .is_empty());
        assert!(decoder.has_pending_input());
        assert_eq!(decoder.flush_collect(), vec![StreamEvent::text("tail")]);
        assert!(decoder.flush_collect().is_empty());
        assert!(!decoder.has_pending_input());
    }

    #[test]
    fn reset_clears_all_state() {
        let mut decoder = StreamDecoder::new();
        decoder.feed_collect(
            "event: text-delta\ndata: {\"text\":\"a\"}\n\nevent: tool-input-available\ndata: {\"callId\":\"c\",\"name\":\"n\",\"input\":1}\n\nevent: text-delta\ndata: {\"te",
        );
        decoder.reset();
        assert_eq!(decoder.accumulated_text(), "");
        assert!(decoder.tool_calls().is_empty());
        assert!(!decoder.has_pending_input());
        assert_eq!(decoder.stats(), DecoderStats::default());
        assert!(decoder.flush_collect().is_empty());
    }

    #[test]
    fn custom_done_marker_from_config() {
        let mut decoder = StreamDecoder::with_config(DecoderConfig::new().with_done_marker("<EOS>"));
        assert_eq!(decoder.feed_collect("data: <EOS>\n\n"), vec![StreamEvent::done()]);
    }
}
