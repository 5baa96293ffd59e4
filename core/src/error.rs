//! Error types for the request lifecycle.
//!
//! # Design
//! Every terminal failure a caller sees is a `RequestFailure`: a status, a
//! string code and a message, whichever transport produced it. The three
//! transport-level kinds (generic, timeout, abort) have fixed values; status
//! and contract failures take theirs from the response. `ConfigError`
//! covers malformed input that is rejected before any request is built.

use thiserror::Error;

use crate::types::StandardResponse;

pub const GENERIC_MESSAGE: &str = "Unknown Error";
pub const TIMEOUT_MESSAGE: &str = "Request Timeout";
pub const ABORT_MESSAGE: &str = "Request Aborted";

/// What produced a `RequestFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connectivity or other transport-level error.
    Transport,
    /// The configured timeout elapsed first.
    Timeout,
    /// The abort signal fired first.
    Abort,
    /// HTTP status outside `[200, 300)` and not 304.
    Status,
    /// The response envelope declared `success: false`.
    Contract,
}

/// The failure half of a request outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (status {status}, code {code})")]
pub struct RequestFailure {
    pub kind: FailureKind,
    pub status: u16,
    pub code: String,
    pub message: String,
    pub stack: Option<String>,
}

impl RequestFailure {
    /// Generic transport error: 500 / "1000".
    pub fn transport(message: Option<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            status: 500,
            code: "1000".to_string(),
            message: message.unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            stack: None,
        }
    }

    /// Timeout: 504 / "1001".
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            status: 504,
            code: "1001".to_string(),
            message: TIMEOUT_MESSAGE.to_string(),
            stack: None,
        }
    }

    /// Abort: 400 / "1002".
    pub fn aborted() -> Self {
        Self {
            kind: FailureKind::Abort,
            status: 400,
            code: "1002".to_string(),
            message: ABORT_MESSAGE.to_string(),
            stack: None,
        }
    }

    /// Failure for an HTTP status outside the success range.
    ///
    /// `body` is the already-parsed response body; its embedded `errorCode`,
    /// `errorMessage` and `errorStack` win over the transport's values.
    pub fn from_status(status: u16, status_text: Option<&str>, body: &serde_json::Value) -> Self {
        let embedded = |key: &str| body.get(key).filter(|v| !v.is_null());
        let code = match embedded("errorCode") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => status.to_string(),
        };
        let message = embedded("errorMessage")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| status_text.filter(|s| !s.is_empty()).map(str::to_string))
            .unwrap_or_else(|| GENERIC_MESSAGE.to_string());
        let stack = embedded("errorStack").and_then(|v| v.as_str()).map(str::to_string);
        Self {
            kind: FailureKind::Status,
            status,
            code,
            message,
            stack,
        }
    }

    /// Failure declared by an envelope with `success: false`.
    pub fn from_contract(resp: StandardResponse) -> Self {
        Self {
            kind: FailureKind::Contract,
            status: resp.status_code,
            code: resp.error_code.to_string(),
            message: resp.error_message.unwrap_or_else(|| GENERIC_MESSAGE.to_string()),
            stack: resp.error_stack,
        }
    }
}

/// Input rejected while building request options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported HTTP method: {0}")]
    UnknownMethod(String),

    #[error("unknown submission type: {0}")]
    UnknownSubmissionType(String),

    #[error("invalid origin {0:?}: {1}")]
    InvalidOrigin(String, url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorCode;
    use serde_json::json;

    #[test]
    fn fixed_kinds_match_taxonomy() {
        let t = RequestFailure::transport(None);
        assert_eq!((t.status, t.code.as_str(), t.message.as_str()), (500, "1000", "Unknown Error"));
        let t = RequestFailure::timeout();
        assert_eq!((t.status, t.code.as_str(), t.message.as_str()), (504, "1001", "Request Timeout"));
        let a = RequestFailure::aborted();
        assert_eq!((a.status, a.code.as_str(), a.message.as_str()), (400, "1002", "Request Aborted"));
    }

    #[test]
    fn status_failure_prefers_body_fields() {
        let body = json!({"errorCode": 4040, "errorMessage": "no such user", "errorStack": "at x"});
        let err = RequestFailure::from_status(404, Some("Not Found"), &body);
        assert_eq!(err.kind, FailureKind::Status);
        assert_eq!(err.status, 404);
        assert_eq!(err.code, "4040");
        assert_eq!(err.message, "no such user");
        assert_eq!(err.stack.as_deref(), Some("at x"));
    }

    #[test]
    fn status_failure_falls_back_to_status_text_then_generic() {
        let err = RequestFailure::from_status(502, Some("Bad Gateway"), &json!({}));
        assert_eq!(err.code, "502");
        assert_eq!(err.message, "Bad Gateway");

        let err = RequestFailure::from_status(599, None, &json!(""));
        assert_eq!(err.code, "599");
        assert_eq!(err.message, "Unknown Error");
    }

    #[test]
    fn contract_failure_uses_envelope() {
        let resp = StandardResponse::failure(403, ErrorCode::Int(4003), None);
        let err = RequestFailure::from_contract(resp);
        assert_eq!(err.kind, FailureKind::Contract);
        assert_eq!(err.status, 403);
        assert_eq!(err.code, "4003");
        assert_eq!(err.message, "Unknown Error");
    }

    #[test]
    fn display_includes_status_and_code() {
        assert_eq!(
            RequestFailure::timeout().to_string(),
            "Request Timeout (status 504, code 1001)"
        );
    }
}
