//! Error Handling Module
//!
//! Error types shared by the transport and session layers:
//! - Core error type (`LlmError`) and its coarse `ErrorCategory`
//! - HTTP status classification for streaming handshakes
//! - Conversions from common error types
//!
//! The decoder itself never returns errors; see `streaming::StreamDecoder`.
//!
//! # Example
//!
//! ```rust,ignore
//! use uistream::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::api_error(503, "upstream overloaded");
//! assert_eq!(error.category(), ErrorCategory::Server);
//! assert!(error.is_retryable());
//! ```

mod classify;
mod conversions;
pub mod types;

pub use classify::classify_http_error;
pub use types::*;
