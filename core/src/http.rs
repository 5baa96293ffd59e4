//! HTTP method and request-body types as plain data.
//!
//! # Design
//! The resolver produces a `Body` without touching the network; each
//! transport turns it into bytes with `Body::to_wire` right before sending.
//! Multipart boundaries are chosen at that point, so the boundary-bearing
//! `Content-Type` is owned by the transport rather than the header manager.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::ConfigError;
use crate::types::FormData;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// GET and HEAD carry their data in the query string and never send a body.
    pub fn is_query(self) -> bool {
        matches!(self, Method::Get | Method::Head)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ConfigError::UnknownMethod(s.to_string())),
        }
    }
}

/// Resolved request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Multipart(FormData),
}

/// Body bytes ready for the wire, plus the content type the transport must
/// set itself (only multipart bodies need one).
#[derive(Debug, Clone, PartialEq)]
pub struct WireBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl Body {
    pub fn to_wire(&self) -> WireBody {
        match self {
            Body::Text(text) => WireBody {
                bytes: text.as_bytes().to_vec(),
                content_type: None,
            },
            Body::Multipart(form) => {
                let boundary = format!("----unifetch{}", Uuid::new_v4().simple());
                WireBody {
                    bytes: form.encode(&boundary),
                    content_type: Some(format!("multipart/form-data; boundary={boundary}")),
                }
            }
        }
    }
}

/// `[200, 300)` and 304 count as success; everything else is a status failure.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status) || status == 304
}
