//! HTTP status classification for stream handshakes.

use reqwest::header::HeaderMap;

use super::types::LlmError;

/// Map a non-2xx stream response onto an `LlmError`.
///
/// `endpoint` is only used to label the message. The body sample is capped so a
/// large HTML error page does not flood the logs.
pub fn classify_http_error(
    endpoint: &str,
    status: u16,
    body_text: &str,
    headers: &HeaderMap,
) -> LlmError {
    fn header_val(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }

    let id_keys = ["x-request-id", "x-trace-id", "traceparent", "x-correlation-id"];
    let request_ids: Vec<String> = id_keys
        .iter()
        .filter_map(|k| header_val(headers, k).map(|v| format!("{k}={v}")))
        .collect();
    let ids_suffix = if request_ids.is_empty() {
        String::new()
    } else {
        format!(" ids=[{}]", request_ids.join(","))
    };
    let body_sample = body_text.chars().take(200).collect::<String>();

    if status == 429 {
        let retry_after = header_val(headers, "retry-after").unwrap_or_default();
        return LlmError::RateLimitError(format!(
            "endpoint={endpoint} http=429 retry_after={retry_after}{ids_suffix} body_sample={body_sample}"
        ));
    }

    if status == 401 || status == 403 {
        return LlmError::AuthenticationError(format!(
            "endpoint={endpoint} http={status}{ids_suffix} body_sample={body_sample}"
        ));
    }

    if status == 400 || status == 413 || status == 415 || status == 422 {
        return LlmError::InvalidInput(format!(
            "endpoint={endpoint} http={status}{ids_suffix} body_sample={body_sample}"
        ));
    }

    // Prefer the producer's own `{ "error": { "message" } }` / `{ "message" }` text.
    let json = serde_json::from_str::<serde_json::Value>(body_text).ok();
    let message = json
        .as_ref()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .or_else(|| v.get("error"))
        })
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            if body_sample.trim().is_empty() {
                if (500..=599).contains(&status) {
                    "server error".to_string()
                } else {
                    "api error".to_string()
                }
            } else {
                body_sample.clone()
            }
        });

    LlmError::ApiError {
        code: status,
        message,
        details: Some(serde_json::json!({
            "status": status,
            "endpoint": endpoint,
            "body": json.unwrap_or(serde_json::Value::String(body_sample)),
        })),
    }
}
