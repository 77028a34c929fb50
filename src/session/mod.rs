//! Cancellable chunked sessions.
//!
//! A session owns one outbound request. Raw chunks from a [`ChunkTransport`]
//! are UTF-8 decoded, fed to a [`StreamDecoder`] and dispatched to
//! [`StreamCallbacks`] on a spawned Tokio task.
//!
//! ```rust,ignore
//! use uistream::session::{Callbacks, ChunkedSession};
//! use uistream::types::HttpConfig;
//!
//! let handle = ChunkedSession::open_http(
//!     HttpConfig::default(),
//!     "https://example.com/api/chat",
//!     serde_json::json!({ "messages": [] }),
//!     Callbacks::new().on_text(|t| print!("{t}")),
//! )?;
//! let outcome = handle.join().await;
//! ```

mod callbacks;
mod handle;
mod transport;

pub use callbacks::*;
pub use handle::{SessionHandle, SessionOutcome, SessionState};
pub use transport::*;

use futures_util::StreamExt;
use std::sync::Arc;
use tracing::Instrument;

use crate::error::LlmError;
use crate::streaming::{DecoderConfig, StreamDecoder, Utf8StreamDecoder};
use crate::types::{CustomEvent, HttpConfig, StreamEvent};
use handle::SessionShared;

/// Entry points for opening sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkedSession;

impl ChunkedSession {
    /// Spawn `request` on the current Tokio runtime and return immediately.
    ///
    /// Without a runtime the session fails at once with a configuration error
    /// and the returned handle is already terminated.
    pub fn open<T, C>(transport: T, request: StreamRequest, callbacks: C) -> SessionHandle
    where
        T: ChunkTransport + 'static,
        C: StreamCallbacks + 'static,
    {
        Self::open_with_config(
            Arc::new(transport),
            request,
            Arc::new(callbacks),
            DecoderConfig::default(),
        )
    }

    pub fn open_with_config(
        transport: Arc<dyn ChunkTransport>,
        request: StreamRequest,
        callbacks: Arc<dyn StreamCallbacks>,
        config: DecoderConfig,
    ) -> SessionHandle {
        let shared = Arc::new(SessionShared::new(callbacks));
        let handle = SessionHandle::new(shared.clone());

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(
                    target: "uistream::session",
                    session_id = %shared.id(),
                    "no Tokio runtime to run the session"
                );
                shared.terminate(SessionOutcome::Failed(LlmError::ConfigurationError(
                    format!("no Tokio runtime available: {e}"),
                )));
                return handle;
            }
        };

        let span = tracing::info_span!(
            target: "uistream::session",
            "session",
            session_id = %shared.id(),
            endpoint = %request.endpoint
        );
        runtime.spawn(drive(shared, transport, request, config).instrument(span));
        handle
    }

    /// Open a session over the `reqwest` transport.
    pub fn open_http<C>(
        config: HttpConfig,
        endpoint: impl Into<String>,
        payload: serde_json::Value,
        callbacks: C,
    ) -> Result<SessionHandle, LlmError>
    where
        C: StreamCallbacks + 'static,
    {
        let transport = HttpTransport::new(config)?;
        Ok(Self::open(
            transport,
            StreamRequest::new(endpoint, payload),
            callbacks,
        ))
    }
}

/// Where decoding stopped.
enum RunEnd {
    Completed,
    Failed(LlmError),
    Cancelled,
}

async fn drive(
    shared: Arc<SessionShared>,
    transport: Arc<dyn ChunkTransport>,
    request: StreamRequest,
    config: DecoderConfig,
) {
    if !shared.mark_open() {
        shared.settle();
        return;
    }
    tracing::debug!(target: "uistream::session", "session open");

    let mut decoder = StreamDecoder::with_config(config);
    let mut utf8 = Utf8StreamDecoder::new();

    let end = {
        let run = run(&shared, transport.as_ref(), &request, &mut decoder, &mut utf8);
        let bounded = async {
            match request.timeout {
                Some(limit) => match tokio::time::timeout(limit, run).await {
                    Ok(end) => end,
                    Err(_) => RunEnd::Failed(LlmError::TimeoutError(format!(
                        "stream did not complete within {limit:?}"
                    ))),
                },
                None => run.await,
            }
        };
        tokio::select! {
            biased;
            _ = shared.token().cancelled() => RunEnd::Cancelled,
            end = bounded => end,
        }
    };

    match end {
        RunEnd::Completed if !shared.is_terminated() => {
            let tail = utf8.finish();
            let mut events = decoder.feed_collect(&tail);
            events.extend(decoder.flush_collect());
            dispatch(&shared, events);
            shared.store_snapshot(decoder.snapshot());
            if shared.terminate(SessionOutcome::Finished) {
                tracing::debug!(
                    target: "uistream::session",
                    stats = ?decoder.stats(),
                    "session finished"
                );
            }
        }
        RunEnd::Failed(err) => {
            shared.store_snapshot(decoder.snapshot());
            if shared.terminate(SessionOutcome::Failed(err.clone())) {
                tracing::warn!(target: "uistream::session", error = %err, "session failed");
            }
        }
        RunEnd::Completed | RunEnd::Cancelled => {
            shared.store_snapshot(decoder.snapshot());
        }
    }

    shared.settle();
}

async fn run(
    shared: &SessionShared,
    transport: &dyn ChunkTransport,
    request: &StreamRequest,
    decoder: &mut StreamDecoder,
    utf8: &mut Utf8StreamDecoder,
) -> RunEnd {
    let mut body = match transport.open(request).await {
        Ok(body) => body,
        Err(err) => return RunEnd::Failed(err),
    };
    if !shared.deliver(|cb| cb.on_start()) {
        return RunEnd::Cancelled;
    }

    while let Some(item) = body.next().await {
        let chunk = match item {
            Ok(chunk) => chunk,
            Err(err) => return RunEnd::Failed(err),
        };
        let text = utf8.decode(&chunk);
        if text.is_empty() {
            continue;
        }
        let events = decoder.feed_collect(&text);
        if !dispatch(shared, events) {
            return RunEnd::Cancelled;
        }
    }
    RunEnd::Completed
}

/// Deliver decoded events in order. Runs of custom events are batched into a
/// single `on_data` call. Returns `false` once the session has ended.
fn dispatch(shared: &SessionShared, events: Vec<StreamEvent>) -> bool {
    let mut batch: Vec<CustomEvent> = Vec::new();
    for event in events {
        let event = match event {
            StreamEvent::Custom(custom) => {
                batch.push(custom);
                continue;
            }
            other => other,
        };
        if !flush_batch(shared, &mut batch) {
            return false;
        }
        let delivered = match &event {
            StreamEvent::TextDelta { text } => shared.deliver(|cb| cb.on_text(text)),
            StreamEvent::ToolInvoked(record) => shared.deliver(|cb| cb.on_tool_call(record)),
            StreamEvent::ToolCompleted(result) => shared.deliver(|cb| cb.on_tool_result(result)),
            StreamEvent::Finished { usage, .. } => shared.deliver(|cb| cb.on_done(usage.as_ref())),
            StreamEvent::Failed { message } => shared.deliver(|cb| cb.on_error(message)),
            StreamEvent::Custom(_) => true,
        };
        if !delivered {
            return false;
        }
    }
    flush_batch(shared, &mut batch)
}

fn flush_batch(shared: &SessionShared, batch: &mut Vec<CustomEvent>) -> bool {
    if batch.is_empty() {
        return true;
    }
    let delivered = shared.deliver(|cb| cb.on_data(batch));
    batch.clear();
    delivered
}
