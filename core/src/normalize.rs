//! Response normalization.
//!
//! # Design
//! Runs only after the status check passed. For JSON responses a parser
//! turns the body into a `StandardResponse`: the per-call parser if any,
//! else the client-wide one, else `default_parser`. A `success: false`
//! envelope becomes a contract failure; otherwise the caller gets `data`.

use serde_json::Value;

use crate::error::RequestFailure;
use crate::options::Parser;
use crate::types::{AcceptType, StandardResponse};

/// Accept bodies that already look like an envelope, wrap everything else.
///
/// "Looks like" means an object with both `success` and `data` keys that
/// deserializes cleanly; a body with the keys but the wrong field types is
/// treated as plain data.
pub fn default_parser(body: Value) -> StandardResponse {
    let conforming = body
        .as_object()
        .is_some_and(|map| map.contains_key("success") && map.contains_key("data"));
    if conforming {
        if let Ok(resp) = serde_json::from_value::<StandardResponse>(body.clone()) {
            return resp;
        }
    }
    StandardResponse::ok(body)
}

pub fn normalize(
    body: Value,
    accept: &AcceptType,
    call_parser: Option<&Parser>,
    global_parser: Option<&Parser>,
) -> Result<Value, RequestFailure> {
    if *accept != AcceptType::Json {
        return Ok(body);
    }
    let resp = match call_parser.or(global_parser) {
        Some(parser) => parser(body),
        None => default_parser(body),
    };
    if resp.success {
        Ok(resp.data)
    } else {
        Err(RequestFailure::from_contract(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::types::ErrorCode;
    use serde_json::json;
    use std::sync::Arc;

    fn custom() -> Parser {
        Arc::new(|body: Value| StandardResponse {
            success: body["error_code"] == 0,
            status_code: 200,
            error_code: ErrorCode::Int(body["error_code"].as_i64().unwrap_or(-1)),
            error_message: body["error"].as_str().map(str::to_string),
            error_stack: None,
            data: body["result"].clone(),
        })
    }

    #[test]
    fn non_standard_body_passes_through() {
        let body = json!({"id": "1234", "name": "test", "age": 32});
        let data = normalize(body.clone(), &AcceptType::Json, None, None).unwrap();
        assert_eq!(data, body);
    }

    #[test]
    fn standard_body_is_unwrapped() {
        let body = json!({"success": true, "data": {"id": 1}});
        let data = normalize(body, &AcceptType::Json, None, None).unwrap();
        assert_eq!(data, json!({"id": 1}));
    }

    #[test]
    fn default_parser_fills_missing_fields() {
        let resp = default_parser(json!({"success": true, "data": null}));
        assert_eq!(resp, StandardResponse::ok(Value::Null));
    }

    #[test]
    fn envelope_with_wrong_types_is_wrapped() {
        let body = json!({"success": "yes", "data": 1});
        let resp = default_parser(body.clone());
        assert!(resp.success);
        assert_eq!(resp.data, body);
    }

    #[test]
    fn contract_failure_is_raised() {
        let body = json!({
            "success": false,
            "statusCode": 403,
            "errorCode": 4003,
            "errorMessage": "forbidden",
            "errorStack": "trace",
            "data": null
        });
        let err = normalize(body, &AcceptType::Json, None, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Contract);
        assert_eq!(err.status, 403);
        assert_eq!(err.code, "4003");
        assert_eq!(err.message, "forbidden");
        assert_eq!(err.stack.as_deref(), Some("trace"));
    }

    #[test]
    fn contract_failure_without_message_gets_generic_one() {
        let body = json!({"success": false, "data": null});
        let err = normalize(body, &AcceptType::Json, None, None).unwrap_err();
        assert_eq!(err.status, 200);
        assert_eq!(err.code, "0");
        assert_eq!(err.message, "Unknown Error");
    }

    #[test]
    fn text_accept_returns_raw_body() {
        let body = Value::String("{\"success\":false}".into());
        let data = normalize(body.clone(), &AcceptType::Text, Some(&custom()), None).unwrap();
        assert_eq!(data, body);
    }

    #[test]
    fn call_parser_wins_over_global() {
        let global: Parser = Arc::new(|_: Value| StandardResponse::failure(500, ErrorCode::Int(1), Some("global".into())));
        let body = json!({"error_code": 0, "error": null, "result": {"ok": true}});
        let data = normalize(body, &AcceptType::Json, Some(&custom()), Some(&global)).unwrap();
        assert_eq!(data, json!({"ok": true}));
    }

    #[test]
    fn global_parser_applies_without_call_parser() {
        let body = json!({"error_code": 7, "error": "custom failure", "result": null});
        let err = normalize(body, &AcceptType::Json, None, Some(&custom())).unwrap_err();
        assert_eq!(err.code, "7");
        assert_eq!(err.message, "custom failure");
    }
}
