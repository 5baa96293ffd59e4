//! Value types shared by the resolver, the transports and the normalizer.
//!
//! # Design
//! `StandardResponse` is the envelope servers are expected to return. Its
//! serde attributes fill the optional fields the same way the structural
//! default parser does, so a conforming body can be deserialized directly.
//! `Payload` is what callers hand to a verb entry; the resolver decides
//! whether it ends up in the query string or in the body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Declared encoding of an outgoing request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionType {
    #[default]
    Json,
    Text,
    UrlEncoded,
    Form,
}

impl FromStr for SubmissionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(SubmissionType::Json),
            "text" => Ok(SubmissionType::Text),
            "urlencoded" => Ok(SubmissionType::UrlEncoded),
            "form" => Ok(SubmissionType::Form),
            _ => Err(ConfigError::UnknownSubmissionType(s.to_string())),
        }
    }
}

/// Declared encoding of the response body.
///
/// Unrecognized tags are kept as `Other`: the request then asks for `*/*`
/// and the transports resolve with an empty string without reading the body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AcceptType {
    #[default]
    Json,
    Text,
    Other(String),
}

impl From<&str> for AcceptType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "json" => AcceptType::Json,
            "text" => AcceptType::Text,
            _ => AcceptType::Other(s.to_string()),
        }
    }
}

/// Data handed to a verb entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A raw string: a query string for GET/HEAD, a body otherwise.
    Text(String),
    /// Structured data: query-encoded for GET/HEAD, encoded per submission
    /// type otherwise.
    Json(Value),
    /// A multipart container, sent as `multipart/form-data`.
    Form(FormData),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Payload::Form(form)
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Field {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Ordered multipart form container.
///
/// The boundary is chosen by the transport at send time, which is also where
/// the `Content-Type: multipart/form-data; boundary=...` header comes from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(FormPart::Field {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.parts.push(FormPart::File {
            name: name.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
        });
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Encode as a `multipart/form-data` body delimited by `boundary`.
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let mut out = Vec::new();
        for part in &self.parts {
            out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match part {
                FormPart::Field { name, value } => {
                    let name = escape_disposition(name);
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                FormPart::File {
                    name,
                    filename,
                    content_type,
                    bytes,
                } => {
                    let (name, filename) = (escape_disposition(name), escape_disposition(filename));
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        out
    }
}

/// Percent-escape the characters that would end a quoted disposition
/// parameter or the header line itself.
fn escape_disposition(value: &str) -> String {
    value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

/// Error code carried by a `StandardResponse`: servers send either a number
/// or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Int(i64),
    Text(String),
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Int(0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Int(code) => write!(f, "{code}"),
            ErrorCode::Text(code) => f.write_str(code),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Int(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        ErrorCode::Text(code.to_string())
    }
}

fn default_status_code() -> u16 {
    200
}

/// The JSON envelope servers are expected to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardResponse {
    pub success: bool,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default)]
    pub error_code: ErrorCode,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_stack: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl StandardResponse {
    /// A successful envelope wrapping `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            status_code: 200,
            error_code: ErrorCode::default(),
            error_message: None,
            error_stack: None,
            data,
        }
    }

    /// A failed envelope.
    pub fn failure(status_code: u16, error_code: ErrorCode, message: Option<String>) -> Self {
        Self {
            success: false,
            status_code,
            error_code,
            error_message: message,
            error_stack: None,
            data: Value::Null,
        }
    }
}
