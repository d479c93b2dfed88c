//! Error taxonomy for the Flowise API client.
//!
//! Every failure a tool call can hit funnels into [`FlowiseError`]:
//!
//! - [`FlowiseError::InvalidParameter`] — a caller-supplied argument was rejected
//!   before any network I/O (e.g. a JSON-string parameter that does not parse).
//! - [`FlowiseError::Transport`] — the request never produced an HTTP response
//!   (connection refused, DNS failure, broken stream).
//! - [`FlowiseError::Timeout`] — the request exceeded the configured deadline.
//!   Kept separate from `Transport` so callers can tell a slow instance apart
//!   from an unreachable one.
//! - [`FlowiseError::Remote`] — Flowise answered with a non-success status. The
//!   status code and response body are preserved verbatim so the calling agent
//!   can react to the platform's own message.

use serde_json::{json, Value};
use std::error::Error;
use std::fmt;

/// Error type for all Flowise client operations.
#[derive(Debug, Clone)]
pub enum FlowiseError {
    /// A request argument failed client-side validation; no request was sent.
    InvalidParameter { name: String, message: String },
    /// The request could not be delivered or the response could not be read.
    Transport(String),
    /// The request exceeded the configured timeout.
    Timeout(String),
    /// Flowise returned a non-success HTTP status.
    Remote { status: u16, body: String },
}

impl FlowiseError {
    /// Classify a `reqwest` failure, splitting timeouts out of the general
    /// transport bucket.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FlowiseError::Timeout(err.to_string())
        } else {
            FlowiseError::Transport(err.to_string())
        }
    }

    /// HTTP status of a remote error, if this error came from the platform.
    pub fn status(&self) -> Option<u16> {
        match self {
            FlowiseError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable tag for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowiseError::InvalidParameter { .. } => "invalid_parameter",
            FlowiseError::Transport(_) => "transport",
            FlowiseError::Timeout(_) => "timeout",
            FlowiseError::Remote { .. } => "remote",
        }
    }

    /// Structured representation used for agent-facing tool responses, so a
    /// failing call surfaces as JSON text instead of tearing down the server.
    pub fn to_value(&self) -> Value {
        match self {
            FlowiseError::InvalidParameter { name, message } => json!({
                "error": { "kind": self.kind(), "parameter": name, "message": message }
            }),
            FlowiseError::Transport(message) | FlowiseError::Timeout(message) => json!({
                "error": { "kind": self.kind(), "message": message }
            }),
            FlowiseError::Remote { status, body } => {
                // Prefer the platform's own `message` field when the body is a
                // JSON object; fall back to the raw body otherwise.
                let message = serde_json::from_str::<Value>(body)
                    .ok()
                    .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                    .unwrap_or_else(|| body.clone());
                json!({
                    "error": { "kind": self.kind(), "status": status, "message": message }
                })
            }
        }
    }
}

impl fmt::Display for FlowiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowiseError::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{}': {}", name, message)
            }
            FlowiseError::Transport(message) => write!(f, "transport error: {}", message),
            FlowiseError::Timeout(message) => write!(f, "request timed out: {}", message),
            FlowiseError::Remote { status, body } => {
                write!(f, "Flowise API error (status {}): {}", status, body)
            }
        }
    }
}

impl Error for FlowiseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_exposes_status_and_body() {
        let err = FlowiseError::Remote {
            status: 404,
            body: r#"{"message":"not found"}"#.to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn remote_error_value_prefers_platform_message() {
        let err = FlowiseError::Remote {
            status: 500,
            body: r#"{"message":"boom","stack":"..."}"#.to_string(),
        };
        let value = err.to_value();
        assert_eq!(value["error"]["status"], 500);
        assert_eq!(value["error"]["message"], "boom");
    }

    #[test]
    fn remote_error_value_falls_back_to_raw_body() {
        let err = FlowiseError::Remote {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_value()["error"]["message"], "Bad Gateway");
    }

    #[test]
    fn timeout_is_distinguishable_from_transport() {
        let timeout = FlowiseError::Timeout("deadline".into());
        let transport = FlowiseError::Transport("refused".into());
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(transport.kind(), "transport");
    }
}
