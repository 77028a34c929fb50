//! # uistream - UI message stream decoding for LLM tool calling
//!
//! Turns the line-framed event stream of a tool-calling chat endpoint into
//! typed events, and runs that stream over a cancellable HTTP session.
//!
#![deny(unsafe_code)]

//! ## Layers
//!
//! - [`streaming::StreamDecoder`]: synchronous, incremental decoder. Feed it
//!   arbitrary text fragments; it reassembles frames, keeps the running text
//!   and an ordered tool-call ledger, and emits [`types::StreamEvent`]s.
//! - [`session::ChunkedSession`]: owns one outbound request, feeds the decoder
//!   from a [`session::ChunkTransport`] and reports through
//!   [`session::StreamCallbacks`] with exactly one terminal callback.
//! - [`streaming::UiEventStreamExt`]: pull-based alternative over any byte
//!   `Stream`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use uistream::prelude::*;
//!
//! let mut decoder = StreamDecoder::new();
//! let events = decoder.feed_collect("event: text-delta\ndata: {\"text\":\"Hi\"}\n\n");
//! assert_eq!(events, vec![StreamEvent::text("Hi")]);
//!
//! let handle = ChunkedSession::open_http(
//!     HttpConfig::builder().bearer_token("sk-...").build(),
//!     "https://example.com/api/chat",
//!     serde_json::json!({ "messages": [] }),
//!     Callbacks::new().on_text(|t| print!("{t}")),
//! )?;
//! handle.join().await;
//! ```

pub mod defaults;
pub mod error;
pub mod session;
pub mod streaming;
pub mod telemetry;
pub mod types;

pub use error::LlmError;
pub use session::{ChunkedSession, SessionHandle, SessionOutcome, StreamCallbacks};
pub use streaming::StreamDecoder;
pub use types::StreamEvent;

/// Commonly used items
pub mod prelude {
    pub use crate::error::{ErrorCategory, LlmError};
    pub use crate::session::{
        Callbacks, ChunkTransport, ChunkedSession, HttpTransport, SessionHandle,
        SessionOutcome, SessionState, StreamCallbacks, StreamRequest,
    };
    pub use crate::streaming::{
        DecoderConfig, FrameEncoder, StreamDecoder, UiEventStreamExt, encode_event_stream,
    };
    pub use crate::types::{
        CustomEvent, HttpConfig, StreamEvent, ToolCallRecord, ToolCallState, ToolPart,
        ToolResult, Usage,
    };
}
