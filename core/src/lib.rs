//! Unified asynchronous HTTP request client core.
//!
//! # Overview
//! One `fetch` call resolves the target URL, encodes the payload, derives
//! headers, runs the exchange over one of two interchangeable transports and
//! normalizes the response into either the caller's payload or a
//! `RequestFailure` carrying a status and an error code.
//!
//! # Design
//! - `RequestSpec` is the single normalized description of a call. Both
//!   transports consume it and nothing downstream reads raw options.
//! - The promise-style transport races network, timer and abort with
//!   `tokio::select!`; the legacy transport drives an event-driven request
//!   whose handlers settle a shared first-writer-wins slot.
//! - Classification and payload normalization live outside the transports
//!   so both produce identical outcomes for identical exchanges.
//! - Cross-call state (client-wide parser, observers) lives in `Client`.
//!   The free functions below use a process-wide instance.

pub mod abort;
pub mod client;
pub mod config;
pub mod content_type;
pub mod error;
pub mod headers;
pub mod http;
pub mod normalize;
pub mod notify;
pub mod options;
pub mod request;
pub mod resolve;
pub mod transport;
pub mod types;

pub use abort::{AbortController, AbortSignal};
pub use client::{
    clear_parser, delete, fetch, get, head, on_complete, on_error, on_success, options, patch, post, put, reset,
    set_parser, upload, Client,
};
pub use config::ClientConfig;
pub use error::{ConfigError, FailureKind, RequestFailure};
pub use http::Method;
pub use notify::Hub;
pub use options::{ContentTypeOverride, RequestOptions};
pub use request::RequestSpec;
pub use transport::TransportKind;
pub use types::{AcceptType, ErrorCode, FormData, FormPart, Payload, StandardResponse, SubmissionType};
