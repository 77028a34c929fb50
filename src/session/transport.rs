//! Chunk transports.
//!
//! A transport turns a [`StreamRequest`] into a stream of raw byte chunks. The
//! session owns framing and decoding; transports only move bytes.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use crate::error::{LlmError, classify_http_error};
use crate::types::HttpConfig;

/// Raw chunks as delivered by a transport.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// One outbound streaming request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub endpoint: String,
    pub payload: serde_json::Value,
    /// Per-request headers, applied after the transport's defaults
    pub headers: HashMap<String, String>,
    /// Upper bound on the whole session, from open to the last chunk
    pub timeout: Option<Duration>,
}

impl StreamRequest {
    pub fn new(endpoint: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            payload,
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Source of raw stream chunks.
///
/// `open` resolves once the peer has accepted the request; the returned stream
/// then yields chunks until the body ends or fails.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, LlmError>;
}

/// Build a reqwest client from `HttpConfig`.
pub fn build_http_client(config: &HttpConfig) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent);
    }
    if !config.headers.is_empty() {
        builder = builder.default_headers(header_map(&config.headers)?);
    }

    builder
        .build()
        .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {e}")))
}

fn header_map(headers: &HashMap<String, String>) -> Result<reqwest::header::HeaderMap, LlmError> {
    let mut out = reqwest::header::HeaderMap::new();
    for (k, v) in headers {
        let name = reqwest::header::HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
        })?;
        let value = reqwest::header::HeaderValue::from_str(v).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
        })?;
        out.insert(name, value);
    }
    Ok(out)
}

/// `reqwest` transport: POSTs the payload as JSON and streams the response body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, LlmError> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Reuse an existing client. Timeouts, user agent and default headers of
    /// `config` are then the client's business; token and compression settings
    /// still apply per request.
    pub fn with_client(client: reqwest::Client, config: HttpConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, LlmError> {
        let mut rb = self
            .client
            .post(&request.endpoint)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .json(&request.payload);
        if self.config.stream_disable_compression {
            rb = rb.header(reqwest::header::ACCEPT_ENCODING, "identity");
        }
        if let Some(token) = &self.config.bearer_token {
            rb = rb.bearer_auth(token.expose_secret());
        }
        if !request.headers.is_empty() {
            rb = rb.headers(header_map(&request.headers)?);
        }

        tracing::debug!(target: "uistream::http", endpoint = %request.endpoint, "opening stream");
        let resp = rb.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let headers = resp.headers().clone();
            let text = resp.text().await.unwrap_or_default();
            let err = classify_http_error(&request.endpoint, status.as_u16(), &text, &headers);
            tracing::warn!(
                target: "uistream::http",
                status = status.as_u16(),
                error = %err,
                "stream request rejected"
            );
            return Err(err);
        }

        tracing::debug!(target: "uistream::http", status = status.as_u16(), "stream accepted");
        let body = resp.bytes_stream().map(|item| {
            item.map_err(|e| {
                if e.is_timeout() {
                    LlmError::TimeoutError(format!("stream body timed out: {e}"))
                } else {
                    LlmError::StreamError(format!("stream body failed: {e}"))
                }
            })
        });
        Ok(Box::pin(body))
    }
}
