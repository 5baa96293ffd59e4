//! Transport selection and the pieces both transports share.
//!
//! # Design
//! The fetch transport and the legacy transport are interchangeable
//! strategies behind `execute`. Which one runs is decided once per call by
//! `select_transport`, from the environment's capabilities and the caller's
//! override. Both finish through `ResponseRules::settle`, so status
//! classification and normalization are identical whichever transport
//! carried the bytes.

pub mod event;
pub mod fetch;
pub mod legacy;

use serde_json::{Map, Value};

use crate::error::RequestFailure;
use crate::http::is_success_status;
use crate::normalize;
use crate::options::Parser;
use crate::request::RequestSpec;
use crate::types::AcceptType;

/// What the running environment offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub fetch: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { fetch: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Fetch,
    Legacy,
}

impl TransportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Fetch => "fetch",
            TransportKind::Legacy => "legacy",
        }
    }
}

pub fn select_transport(capabilities: Capabilities, force_legacy: bool) -> TransportKind {
    if capabilities.fetch && !force_legacy {
        TransportKind::Fetch
    } else {
        TransportKind::Legacy
    }
}

/// Run `spec` over the chosen transport.
pub async fn execute(
    kind: TransportKind,
    spec: &RequestSpec,
    global_parser: Option<Parser>,
) -> Result<Value, RequestFailure> {
    match kind {
        TransportKind::Fetch => fetch::execute(spec, global_parser).await,
        TransportKind::Legacy => legacy::execute(spec, global_parser).await,
    }
}

/// JSON body, or `{}` when the text is empty or not JSON.
pub(crate) fn parse_json_or_empty(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// Read a whole response body, however large.
///
/// ureq caps `read_to_string` at 10 MiB; this lifts the cap. Bytes that are
/// not UTF-8 decode to `""`. I/O errors, including read timeouts, are
/// returned to the caller.
pub(crate) fn read_body(body: &mut ureq::Body) -> Result<String, ureq::Error> {
    let bytes = body.with_config().limit(u64::MAX).read_to_vec()?;
    Ok(String::from_utf8(bytes).unwrap_or_default())
}

/// What a transport needs to turn a finished exchange into an outcome.
///
/// Holds the accept type and parsers only, never the request body, so the
/// legacy load handler can own one for the lifetime of the exchange.
#[derive(Clone)]
pub(crate) struct ResponseRules {
    pub accept: AcceptType,
    pub call_parser: Option<Parser>,
    pub global_parser: Option<Parser>,
}

impl ResponseRules {
    pub fn new(spec: &RequestSpec, global_parser: Option<Parser>) -> Self {
        Self {
            accept: spec.accept.clone(),
            call_parser: spec.parser.clone(),
            global_parser,
        }
    }

    /// Whether the body has to be read at all.
    pub fn reads_body(&self) -> bool {
        !matches!(self.accept, AcceptType::Other(_))
    }

    /// Body text as the accept type dictates.
    pub fn decode(&self, text: String) -> Value {
        match self.accept {
            AcceptType::Json => parse_json_or_empty(&text),
            AcceptType::Text => Value::String(text),
            AcceptType::Other(_) => Value::String(String::new()),
        }
    }

    /// Classify the status, then normalize the decoded body.
    pub fn settle(&self, status: u16, status_text: Option<&str>, body: Value) -> Result<Value, RequestFailure> {
        if !is_success_status(status) {
            return Err(RequestFailure::from_status(status, status_text, &body));
        }
        normalize::normalize(
            body,
            &self.accept,
            self.call_parser.as_ref(),
            self.global_parser.as_ref(),
        )
    }
}
