//! Default Configuration Values
//!
//! Centralizes the default values used by the decoder and the HTTP transport.

use std::time::Duration;

/// HTTP client defaults
pub mod http {
    use super::*;

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("uistream/", env!("CARGO_PKG_VERSION"));

    /// Env var that overrides `HttpConfig::stream_disable_compression`
    pub const STREAM_DISABLE_COMPRESSION_ENV: &str = "UISTREAM_STREAM_DISABLE_COMPRESSION";
}

/// Decoder defaults
pub mod decoder {
    /// Data value that stands for an unparameterized finish
    pub const DONE_MARKER: &str = "[DONE]";

    /// Lifecycle markers that are consumed without emitting an event.
    pub const IGNORED_EVENTS: &[&str] = &[
        "start",
        "start-step",
        "finish-step",
        "text-start",
        "text-end",
        "reasoning",
        "reasoning-start",
        "reasoning-delta",
        "reasoning-end",
        "tool-input-start",
        "tool-input-delta",
        "message-metadata",
        "source-url",
        "source-document",
        "file",
        "abort",
    ];
}
