//! URL and body resolution.
//!
//! # Design
//! Query methods (GET, HEAD) move their data into the query string and never
//! send a body; every other method encodes the data per submission type.
//! All functions here are pure, so resolving the same input twice yields
//! byte-identical URLs and bodies.

use serde_json::{Map, Value};
use url::{form_urlencoded, Url};

use crate::http::{Body, Method};
use crate::types::{Payload, SubmissionType};

/// Join `raw` against `origin` when it is relative and report whether the
/// target host differs from the origin's.
///
/// Without an origin every absolute URL is cross-origin, and relative URLs
/// are left untouched and treated as same-origin.
pub fn resolve_target(raw: &str, origin: Option<&Url>) -> (String, bool) {
    match Url::parse(raw) {
        Ok(target) => {
            let cross = match origin {
                Some(origin) => !same_host(&target, origin),
                None => true,
            };
            (raw.to_string(), cross)
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => match origin.map(|o| o.join(raw)) {
            Some(Ok(joined)) => (joined.to_string(), false),
            _ => (raw.to_string(), false),
        },
        Err(_) => (raw.to_string(), false),
    }
}

fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// Serialize a JSON object as `application/x-www-form-urlencoded`.
///
/// Arrays repeat their key, nulls become empty values and nested objects
/// are JSON-encoded. Returns `None` for anything that is not an object.
pub fn encode_query(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    Some(encode_pairs(map))
}

fn encode_pairs(map: &Map<String, Value>) -> String {
    let mut ser = form_urlencoded::Serializer::new(String::new());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    ser.append_pair(key, &scalar(item));
                }
            }
            other => {
                ser.append_pair(key, &scalar(other));
            }
        }
    }
    ser.finish()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Append query data to `url` for query methods. Other methods get `url`
/// back unchanged.
pub fn append_query(url: &str, method: Method, data: Option<&Payload>) -> String {
    if !method.is_query() {
        return url.to_string();
    }
    let query = match data {
        Some(Payload::Text(text)) => text.strip_prefix('?').unwrap_or(text).to_string(),
        Some(Payload::Json(value)) => encode_query(value).unwrap_or_default(),
        Some(Payload::Form(_)) | None => String::new(),
    };
    if query.is_empty() {
        return url.to_string();
    }
    let separator = match url.find('?') {
        None => "?",
        Some(_) if url.ends_with('?') || url.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{url}{separator}{query}")
}

/// Encode the request body. Query methods and null data send nothing.
pub fn resolve_body(method: Method, submission: SubmissionType, data: Option<Payload>) -> Option<Body> {
    if method.is_query() {
        return None;
    }
    match data? {
        Payload::Form(form) => Some(Body::Multipart(form)),
        Payload::Json(Value::Null) => None,
        Payload::Text(text) => Some(Body::Text(match submission {
            SubmissionType::Json => Value::String(text).to_string(),
            SubmissionType::Text | SubmissionType::UrlEncoded | SubmissionType::Form => text,
        })),
        Payload::Json(value) => Some(Body::Text(match (submission, value) {
            (SubmissionType::UrlEncoded, Value::Object(map)) => encode_pairs(&map),
            (SubmissionType::Json, value) => value.to_string(),
            (_, Value::String(text)) => text,
            (_, value) => value.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormData;
    use serde_json::json;

    fn origin() -> Url {
        Url::parse("http://app.local:8080/").unwrap()
    }

    #[test]
    fn relative_url_joins_origin_and_is_same_origin() {
        let (url, cross) = resolve_target("/api/users", Some(&origin()));
        assert_eq!(url, "http://app.local:8080/api/users");
        assert!(!cross);
    }

    #[test]
    fn host_or_port_mismatch_is_cross_origin() {
        assert!(resolve_target("http://other.local:8080/x", Some(&origin())).1);
        assert!(resolve_target("http://app.local:9090/x", Some(&origin())).1);
        assert!(!resolve_target("http://app.local:8080/x", Some(&origin())).1);
    }

    #[test]
    fn no_origin_means_absolute_urls_are_cross_origin() {
        assert!(resolve_target("http://app.local/x", None).1);
        let (url, cross) = resolve_target("/x", None);
        assert_eq!(url, "/x");
        assert!(!cross);
    }

    #[test]
    fn query_object_is_percent_encoded() {
        let data = Payload::Json(json!({"name": "a b&c", "tags": ["x", "y"], "n": 3, "none": null}));
        let url = append_query("http://h/api", Method::Get, Some(&data));
        assert_eq!(url, "http://h/api?n=3&name=a+b%26c&none=&tags=x&tags=y");
    }

    #[test]
    fn query_resolution_is_idempotent() {
        let data = Payload::Json(json!({"q": "ünïcode", "page": 2}));
        let a = append_query("http://h/s", Method::Head, Some(&data));
        let b = append_query("http://h/s", Method::Head, Some(&data));
        assert_eq!(a, b);
    }

    #[test]
    fn query_string_separator_is_not_doubled() {
        let data = Payload::Text("?a=1".into());
        assert_eq!(append_query("http://h/p", Method::Get, Some(&data)), "http://h/p?a=1");
        let data = Payload::Text("b=2".into());
        assert_eq!(append_query("http://h/p?a=1", Method::Get, Some(&data)), "http://h/p?a=1&b=2");
        assert_eq!(append_query("http://h/p?", Method::Get, Some(&data)), "http://h/p?b=2");
    }

    #[test]
    fn empty_query_data_leaves_url_alone() {
        for data in [Payload::Text(String::new()), Payload::Json(json!({})), Payload::Json(Value::Null)] {
            assert_eq!(append_query("http://h/p", Method::Get, Some(&data)), "http://h/p");
        }
        assert_eq!(append_query("http://h/p", Method::Get, None), "http://h/p");
    }

    #[test]
    fn write_methods_do_not_touch_the_url() {
        let data = Payload::Json(json!({"a": 1}));
        assert_eq!(append_query("http://h/p", Method::Post, Some(&data)), "http://h/p");
    }

    #[test]
    fn query_methods_never_send_a_body() {
        let data = Payload::Json(json!({"a": 1}));
        assert!(resolve_body(Method::Get, SubmissionType::Json, Some(data.clone())).is_none());
        assert!(resolve_body(Method::Head, SubmissionType::Json, Some(data)).is_none());
    }

    #[test]
    fn json_body_is_json_encoded() {
        let value = json!({"name": "test", "age": 32});
        let body = resolve_body(Method::Post, SubmissionType::Json, Some(Payload::Json(value.clone())));
        let Some(Body::Text(text)) = body else { panic!("expected text body") };
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);

        let body = resolve_body(Method::Put, SubmissionType::Json, Some("hi".into()));
        assert_eq!(body, Some(Body::Text("\"hi\"".into())));
    }

    #[test]
    fn urlencoded_body_is_form_encoded() {
        let body = resolve_body(
            Method::Patch,
            SubmissionType::UrlEncoded,
            Some(Payload::Json(json!({"a": "1 2", "b": true}))),
        );
        assert_eq!(body, Some(Body::Text("a=1+2&b=true".into())));

        let body = resolve_body(Method::Post, SubmissionType::UrlEncoded, Some("raw=1".into()));
        assert_eq!(body, Some(Body::Text("raw=1".into())));
    }

    #[test]
    fn text_and_form_pass_through() {
        let body = resolve_body(Method::Post, SubmissionType::Text, Some("plain".into()));
        assert_eq!(body, Some(Body::Text("plain".into())));

        let form = FormData::new().text("k", "v");
        let body = resolve_body(Method::Post, SubmissionType::Form, Some(Payload::Form(form.clone())));
        assert_eq!(body, Some(Body::Multipart(form)));
    }

    #[test]
    fn null_data_omits_body() {
        assert!(resolve_body(Method::Delete, SubmissionType::Json, Some(Payload::Json(Value::Null))).is_none());
        assert!(resolve_body(Method::Delete, SubmissionType::Json, None).is_none());
    }
}
