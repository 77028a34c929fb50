//! In-memory transport and recording callbacks for session tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use uistream::error::LlmError;
use uistream::session::{
    ByteStream, ChunkTransport, SessionHandle, StreamCallbacks, StreamRequest,
};
use uistream::types::{CustomEvent, ToolCallRecord, ToolResult, Usage};

/// One step of a scripted transport.
#[derive(Debug, Clone)]
pub enum Step {
    Chunk(Bytes),
    Fail(LlmError),
    Sleep(Duration),
    /// Block until the test calls [`ScriptedTransport::release`].
    Gate,
}

pub fn chunk(s: &str) -> Step {
    Step::Chunk(Bytes::copy_from_slice(s.as_bytes()))
}

/// Transport that replays a script of chunks, errors and pauses.
#[derive(Clone)]
pub struct ScriptedTransport {
    open_result: Option<LlmError>,
    steps: Vec<Step>,
    gate: Arc<Notify>,
    opened: Arc<Mutex<Vec<StreamRequest>>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            open_result: None,
            steps,
            gate: Arc::new(Notify::new()),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn rejecting(error: LlmError) -> Self {
        Self {
            open_result: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn opened(&self) -> Vec<StreamRequest> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkTransport for ScriptedTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, LlmError> {
        self.opened.lock().unwrap().push(request.clone());
        if let Some(err) = &self.open_result {
            return Err(err.clone());
        }
        let steps = self.steps.clone();
        let gate = self.gate.clone();
        let stream = async_stream::stream! {
            for step in steps {
                match step {
                    Step::Chunk(bytes) => yield Ok(bytes),
                    Step::Fail(err) => {
                        yield Err(err);
                        return;
                    }
                    Step::Sleep(d) => tokio::time::sleep(d).await,
                    Step::Gate => gate.notified().await,
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Records every callback as a short string.
#[derive(Default)]
pub struct Recorder {
    log: Mutex<Vec<String>>,
    cancel_on_text: Mutex<Option<SessionHandle>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log().iter().filter(|l| l.starts_with(prefix)).count()
    }

    /// Cancel `handle` from inside the next `on_text` callback.
    pub fn cancel_on_text(&self, handle: SessionHandle) {
        *self.cancel_on_text.lock().unwrap() = Some(handle);
    }

    /// Append an entry from outside a callback.
    pub fn mark(&self, entry: &str) {
        self.push(entry.to_string());
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl StreamCallbacks for Recorder {
    fn on_start(&self) {
        self.push("start".into());
    }
    fn on_text(&self, delta: &str) {
        self.push(format!("text:{delta}"));
        let pending = self.cancel_on_text.lock().unwrap().take();
        if let Some(handle) = pending {
            handle.cancel();
            self.push("cancel-returned".into());
        }
    }
    fn on_tool_call(&self, call: &ToolCallRecord) {
        self.push(format!("tool-call:{}:{}", call.id, call.name));
    }
    fn on_tool_result(&self, result: &ToolResult) {
        self.push(format!("tool-result:{}:{}", result.call_id, result.output));
    }
    fn on_done(&self, usage: Option<&Usage>) {
        self.push(format!(
            "done:{}",
            usage.and_then(Usage::total).map_or("-".to_string(), |t| t.to_string())
        ));
    }
    fn on_error(&self, message: &str) {
        self.push(format!("error:{message}"));
    }
    fn on_data(&self, events: &[CustomEvent]) {
        let tags: Vec<&str> = events.iter().map(|e| e.tag.as_str()).collect();
        self.push(format!("data:{}", tags.join(",")));
    }
    fn on_finish(&self) {
        self.push("finish".into());
    }
    fn on_failed(&self, error: &LlmError) {
        self.push(format!("failed:{error}"));
    }
    fn on_cancelled(&self) {
        self.push("cancelled".into());
    }
}

/// Give a spawned session time to run after a state change.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

/// Poll `cond` until it holds, failing the test after two seconds.
pub async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
