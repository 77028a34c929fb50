//! Session callbacks.
//!
//! Non-terminal callbacks run in event order on the session task. Exactly one
//! of `on_finish`, `on_failed` or `on_cancelled` ends every session that was
//! opened; no other callback starts after it.
//!
//! `on_error` sees every error message: in-stream error frames, and transport
//! failures unless `on_failed` is overridden.

use std::sync::Arc;

use crate::error::LlmError;
use crate::types::{CustomEvent, ToolCallRecord, ToolResult, Usage};

/// Receiver for session events. Every method except `on_failed` defaults to a
/// no-op.
///
/// Callbacks are invoked while the session holds its delivery lock, so they
/// should return quickly. Calling [`SessionHandle::cancel`] from inside a
/// callback is allowed; `on_cancelled` then follows as soon as the callback
/// returns.
///
/// [`SessionHandle::cancel`]: super::SessionHandle::cancel
pub trait StreamCallbacks: Send + Sync {
    /// The transport accepted the request; no chunk has been decoded yet.
    fn on_start(&self) {}

    fn on_text(&self, _delta: &str) {}

    fn on_tool_call(&self, _call: &ToolCallRecord) {}

    fn on_tool_result(&self, _result: &ToolResult) {}

    /// A finish frame arrived. Decoding continues until the transport ends.
    fn on_done(&self, _usage: Option<&Usage>) {}

    /// An error message. In-stream error frames arrive here and decoding
    /// continues; a transport failure arrives here through the default
    /// `on_failed`.
    fn on_error(&self, _message: &str) {}

    /// Consecutive custom frames decoded from one chunk.
    fn on_data(&self, _events: &[CustomEvent]) {}

    fn on_finish(&self) {}

    /// Terminal transport failure. Defaults to `on_error` with the error's
    /// user message; override to receive the typed error instead.
    fn on_failed(&self, error: &LlmError) {
        self.on_error(&error.user_message());
    }

    fn on_cancelled(&self) {}
}

impl<T: StreamCallbacks + ?Sized> StreamCallbacks for Arc<T> {
    fn on_start(&self) {
        (**self).on_start()
    }
    fn on_text(&self, delta: &str) {
        (**self).on_text(delta)
    }
    fn on_tool_call(&self, call: &ToolCallRecord) {
        (**self).on_tool_call(call)
    }
    fn on_tool_result(&self, result: &ToolResult) {
        (**self).on_tool_result(result)
    }
    fn on_done(&self, usage: Option<&Usage>) {
        (**self).on_done(usage)
    }
    fn on_error(&self, message: &str) {
        (**self).on_error(message)
    }
    fn on_data(&self, events: &[CustomEvent]) {
        (**self).on_data(events)
    }
    fn on_finish(&self) {
        (**self).on_finish()
    }
    fn on_failed(&self, error: &LlmError) {
        (**self).on_failed(error)
    }
    fn on_cancelled(&self) {
        (**self).on_cancelled()
    }
}

type UnitFn = Arc<dyn Fn() + Send + Sync>;
type StrFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Closure-based [`StreamCallbacks`].
///
/// ```rust,ignore
/// let callbacks = Callbacks::new()
///     .on_text(|delta| print!("{delta}"))
///     .on_failed(|err| eprintln!("stream failed: {err}"));
/// ```
#[derive(Clone, Default)]
pub struct Callbacks {
    start: Option<UnitFn>,
    text: Option<StrFn>,
    tool_call: Option<Arc<dyn Fn(&ToolCallRecord) + Send + Sync>>,
    tool_result: Option<Arc<dyn Fn(&ToolResult) + Send + Sync>>,
    done: Option<Arc<dyn Fn(Option<&Usage>) + Send + Sync>>,
    error: Option<StrFn>,
    data: Option<Arc<dyn Fn(&[CustomEvent]) + Send + Sync>>,
    finish: Option<UnitFn>,
    failed: Option<Arc<dyn Fn(&LlmError) + Send + Sync>>,
    cancelled: Option<UnitFn>,
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.start.is_some())
            .field("on_text", &self.text.is_some())
            .field("on_tool_call", &self.tool_call.is_some())
            .field("on_tool_result", &self.tool_result.is_some())
            .field("on_done", &self.done.is_some())
            .field("on_error", &self.error.is_some())
            .field("on_data", &self.data.is_some())
            .field("on_finish", &self.finish.is_some())
            .field("on_failed", &self.failed.is_some())
            .field("on_cancelled", &self.cancelled.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.start = Some(Arc::new(f));
        self
    }

    pub fn on_text(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.text = Some(Arc::new(f));
        self
    }

    pub fn on_tool_call(mut self, f: impl Fn(&ToolCallRecord) + Send + Sync + 'static) -> Self {
        self.tool_call = Some(Arc::new(f));
        self
    }

    pub fn on_tool_result(mut self, f: impl Fn(&ToolResult) + Send + Sync + 'static) -> Self {
        self.tool_result = Some(Arc::new(f));
        self
    }

    pub fn on_done(mut self, f: impl Fn(Option<&Usage>) + Send + Sync + 'static) -> Self {
        self.done = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn on_data(mut self, f: impl Fn(&[CustomEvent]) + Send + Sync + 'static) -> Self {
        self.data = Some(Arc::new(f));
        self
    }

    pub fn on_finish(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.finish = Some(Arc::new(f));
        self
    }

    pub fn on_failed(mut self, f: impl Fn(&LlmError) + Send + Sync + 'static) -> Self {
        self.failed = Some(Arc::new(f));
        self
    }

    pub fn on_cancelled(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.cancelled = Some(Arc::new(f));
        self
    }
}

impl StreamCallbacks for Callbacks {
    fn on_start(&self) {
        if let Some(f) = &self.start {
            f();
        }
    }

    fn on_text(&self, delta: &str) {
        if let Some(f) = &self.text {
            f(delta);
        }
    }

    fn on_tool_call(&self, call: &ToolCallRecord) {
        if let Some(f) = &self.tool_call {
            f(call);
        }
    }

    fn on_tool_result(&self, result: &ToolResult) {
        if let Some(f) = &self.tool_result {
            f(result);
        }
    }

    fn on_done(&self, usage: Option<&Usage>) {
        if let Some(f) = &self.done {
            f(usage);
        }
    }

    fn on_error(&self, message: &str) {
        if let Some(f) = &self.error {
            f(message);
        }
    }

    fn on_data(&self, events: &[CustomEvent]) {
        if let Some(f) = &self.data {
            f(events);
        }
    }

    fn on_finish(&self) {
        if let Some(f) = &self.finish {
            f();
        }
    }

    fn on_failed(&self, error: &LlmError) {
        match &self.failed {
            Some(f) => f(error),
            None => self.on_error(&error.user_message()),
        }
    }

    fn on_cancelled(&self) {
        if let Some(f) = &self.cancelled {
            f();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_receive_their_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s1 = seen.clone();
        let s2 = seen.clone();
        let cbs = Callbacks::new()
            .on_text(move |t| s1.lock().unwrap().push(format!("text:{t}")))
            .on_finish(move || s2.lock().unwrap().push("finish".to_string()));

        StreamCallbacks::on_text(&cbs, "hi");
        StreamCallbacks::on_done(&cbs, None);
        StreamCallbacks::on_finish(&cbs);

        assert_eq!(*seen.lock().unwrap(), vec!["text:hi", "finish"]);
    }

    #[test]
    fn failure_falls_back_to_on_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let cbs = Callbacks::new().on_error(move |m| sink.lock().unwrap().push(m.to_string()));

        StreamCallbacks::on_failed(&cbs, &LlmError::StreamError("reset".into()));
        assert_eq!(*errors.lock().unwrap(), vec!["reset"]);
    }

    #[test]
    fn failure_goes_only_to_on_failed_when_set() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let failures = Arc::new(Mutex::new(Vec::new()));
        let e = errors.clone();
        let f = failures.clone();
        let cbs = Callbacks::new()
            .on_error(move |m| e.lock().unwrap().push(m.to_string()))
            .on_failed(move |err| f.lock().unwrap().push(err.clone()));

        StreamCallbacks::on_failed(&cbs, &LlmError::TimeoutError("slow".into()));
        assert!(errors.lock().unwrap().is_empty());
        assert_eq!(
            *failures.lock().unwrap(),
            vec![LlmError::TimeoutError("slow".into())]
        );
    }

    #[test]
    fn trait_default_forwards_failure_through_arc() {
        #[derive(Default)]
        struct ErrorsOnly(Mutex<Vec<String>>);
        impl StreamCallbacks for ErrorsOnly {
            fn on_error(&self, message: &str) {
                self.0.lock().unwrap().push(message.to_string());
            }
        }

        let cbs = Arc::new(ErrorsOnly::default());
        cbs.on_failed(&LlmError::api_error(503, "overloaded"));
        assert_eq!(*cbs.0.lock().unwrap(), vec!["overloaded"]);
    }

    #[test]
    fn unset_hooks_are_noops() {
        let cbs = Callbacks::new();
        StreamCallbacks::on_start(&cbs);
        StreamCallbacks::on_failed(&cbs, &LlmError::StreamError("x".into()));
        assert!(format!("{cbs:?}").contains("on_text: false"));
    }
}
