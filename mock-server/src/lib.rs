//! HTTP fixture server for the client core's integration tests.
//!
//! Every route accepts any method. Responses cover the shapes the client has
//! to normalize: the standard envelope, bare payloads, a custom envelope,
//! contract failures, arbitrary statuses, slow responses, plain text and
//! oversized bodies.

use std::time::Duration;

use axum::{
    extract::{Path, RawQuery},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

/// The envelope the client treats as a standard response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    pub status_code: u16,
    pub error_code: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            status_code: 200,
            error_code: json!(0),
            error_message: None,
            data,
        }
    }

    pub fn failure(status_code: u16, error_code: Value, message: &str) -> Self {
        Self {
            success: false,
            status_code,
            error_code,
            error_message: Some(message.to_string()),
            data: Value::Null,
        }
    }
}

/// What `/api/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/api/standard", any(standard))
        .route("/api/non-standard", any(non_standard))
        .route("/api/custom", any(custom))
        .route("/api/custom-fail", any(custom_fail))
        .route("/api/failure", any(failure))
        .route("/api/status/{code}", any(status))
        .route("/api/delay/{ms}", any(delay))
        .route("/api/echo", any(echo))
        .route("/api/text", any(text))
        .route("/api/large/{bytes}", any(large))
        .route("/api/large-failure/{bytes}", any(large_failure))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Wraps the query string and the body (parsed when it is JSON) in a
/// successful envelope.
async fn standard(RawQuery(query): RawQuery, body: String) -> Json<Envelope> {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };
    Json(Envelope::ok(json!({ "query": query, "body": body })))
}

async fn non_standard() -> Json<Value> {
    Json(json!({ "id": "1234", "name": "test", "age": 32 }))
}

async fn custom() -> Json<Value> {
    Json(json!({ "error_code": 0, "error": null, "result": { "id": 1, "name": "custom" } }))
}

async fn custom_fail() -> Json<Value> {
    Json(json!({ "error_code": 4001, "error": "custom failure", "result": null }))
}

async fn failure() -> Json<Envelope> {
    Json(Envelope::failure(403, json!(4003), "forbidden"))
}

async fn status(Path(code): Path<u16>) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    debug!(%status, "fixed status");
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return status.into_response();
    }
    (status, Json(json!({ "message": format!("status {code}") }))).into_response()
}

async fn delay(Path(ms): Path<u64>) -> Json<Envelope> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(Envelope::ok(json!({ "delayed": ms })))
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Envelope> {
    let echo = Echo {
        method: method.to_string(),
        query,
        content_type: header_value(&headers, header::CONTENT_TYPE),
        accept: header_value(&headers, header::ACCEPT),
        body,
    };
    debug!(method = %echo.method, bytes = echo.body.len(), "echo");
    Json(Envelope::ok(json!(echo)))
}

async fn text() -> &'static str {
    "plain text body"
}

/// A successful envelope whose `data` is a string of `bytes` letters.
async fn large(Path(bytes): Path<usize>) -> Json<Envelope> {
    Json(Envelope::ok(Value::String("a".repeat(bytes))))
}

/// A 500 whose body carries an embedded error after `bytes` of padding.
async fn large_failure(Path(bytes): Path<usize>) -> Response {
    let body = json!({
        "padding": "a".repeat(bytes),
        "errorCode": "E_LARGE",
        "errorMessage": "large failure",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_envelope_serializes_camel_case() {
        let value = serde_json::to_value(Envelope::ok(json!({"a": 1}))).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["errorCode"], 0);
        assert!(value.get("errorMessage").is_none());
        assert_eq!(value["data"]["a"], 1);
    }

    #[test]
    fn failure_envelope_carries_message_and_null_data() {
        let value = serde_json::to_value(Envelope::failure(403, json!("E1"), "nope")).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["statusCode"], 403);
        assert_eq!(value["errorCode"], "E1");
        assert_eq!(value["errorMessage"], "nope");
        assert!(value["data"].is_null());
    }

    #[test]
    fn echo_uses_camel_case_keys() {
        let echo = Echo {
            method: "GET".into(),
            query: None,
            content_type: Some("text/plain".into()),
            accept: None,
            body: String::new(),
        };
        let value = serde_json::to_value(echo).unwrap();
        assert_eq!(value["contentType"], "text/plain");
        assert!(value["query"].is_null());
    }
}
