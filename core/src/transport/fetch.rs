//! Promise-style transport.
//!
//! # Design
//! The network chain (send, read, classify, normalize) is one future. It is
//! raced with `tokio::select!` against the abort signal and, when a timeout
//! is configured, a timer. The first branch to finish decides the outcome;
//! the other two are dropped with the `select!`, which is also what releases
//! the timer. The blocking socket work runs on tokio's blocking pool, so a
//! lost race stops the waiting but not an already-started exchange.

use std::future::pending;

use serde_json::Value;
use tracing::{debug, trace};

use super::{read_body, ResponseRules};
use crate::error::RequestFailure;
use crate::headers::CONTENT_TYPE;
use crate::http::Method;
use crate::options::Parser;
use crate::request::RequestSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsMode {
    Include,
    SameOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Cors,
    SameOrigin,
}

/// Only normal HTTP caching semantics are used; nothing forces a bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Default,
}

/// Transport settings derived from a `RequestSpec`.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchInit {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: CredentialsMode,
    pub mode: RequestMode,
    pub cache: CacheMode,
}

pub fn build_init(spec: &RequestSpec) -> FetchInit {
    let mut headers: Vec<(String, String)> = spec
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let body = spec.body.as_ref().map(|body| {
        let wire = body.to_wire();
        if let Some(content_type) = wire.content_type {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE));
            headers.push((CONTENT_TYPE.to_string(), content_type));
        }
        wire.bytes
    });
    FetchInit {
        method: spec.method,
        url: spec.url.clone(),
        headers,
        body,
        credentials: if spec.send_credentials {
            CredentialsMode::Include
        } else {
            CredentialsMode::SameOrigin
        },
        mode: if spec.is_cross_origin {
            RequestMode::Cors
        } else {
            RequestMode::SameOrigin
        },
        cache: CacheMode::Default,
    }
}

struct RawResponse {
    status: u16,
    status_text: Option<String>,
    text: String,
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}

fn read_failure(e: ureq::Error) -> RequestFailure {
    match e {
        ureq::Error::Timeout(_) => RequestFailure::timeout(),
        other => RequestFailure::transport(Some(other.to_string())),
    }
}

/// Execute `init`, reading the body text only when `read` is set.
fn dispatch(init: FetchInit, read: bool) -> Result<RawResponse, RequestFailure> {
    let mut builder = ureq::http::Request::builder()
        .method(init.method.as_str())
        .uri(init.url.as_str());
    for (name, value) in &init.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let invalid = |e: ureq::http::Error| RequestFailure::transport(Some(e.to_string()));
    let agent = agent();
    let result = match init.body {
        Some(bytes) => agent.run(builder.body(bytes).map_err(invalid)?),
        None => agent.run(builder.body(()).map_err(invalid)?),
    };
    let mut response = result.map_err(read_failure)?;

    let status = response.status();
    let text = if read {
        read_body(response.body_mut()).map_err(read_failure)?
    } else {
        String::new()
    };
    Ok(RawResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().map(str::to_string),
        text,
    })
}

async fn network(init: FetchInit, rules: ResponseRules) -> Result<Value, RequestFailure> {
    let read = rules.reads_body();
    let raw = tokio::task::spawn_blocking(move || dispatch(init, read))
        .await
        .map_err(|e| RequestFailure::transport(Some(e.to_string())))??;
    debug!(status = raw.status, bytes = raw.text.len(), "response received");
    let body = rules.decode(raw.text);
    rules.settle(raw.status, raw.status_text.as_deref(), body)
}

pub async fn execute(spec: &RequestSpec, global_parser: Option<Parser>) -> Result<Value, RequestFailure> {
    let init = build_init(spec);
    let rules = ResponseRules::new(spec, global_parser);
    trace!(credentials = ?init.credentials, mode = ?init.mode, cache = ?init.cache, "dispatching");

    let timer = async {
        if spec.timeout_enabled() {
            tokio::time::sleep(spec.timeout).await
        } else {
            pending::<()>().await
        }
    };
    let aborted = async {
        match &spec.abort {
            Some(signal) => signal.aborted().await,
            None => pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = aborted => {
            debug!("aborted");
            Err(RequestFailure::aborted())
        }
        _ = timer => {
            debug!(timeout_ms = spec.timeout.as_millis() as u64, "timed out");
            Err(RequestFailure::timeout())
        }
        outcome = network(init, rules) => outcome,
    }
}
