//! Per-call configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::abort::AbortSignal;
use crate::http::Method;
use crate::types::{AcceptType, StandardResponse, SubmissionType};

/// Maps a raw JSON body to the standard envelope.
pub type Parser = Arc<dyn Fn(Value) -> StandardResponse + Send + Sync>;

/// Upload progress observer, called with `(loaded, total)` bytes.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Caller control over the `Content-Type` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ContentTypeOverride {
    /// Derive it from the submission type.
    #[default]
    Derived,
    /// Send exactly this value.
    Explicit(String),
    /// Send no `Content-Type` at all.
    Omit,
}

impl From<bool> for ContentTypeOverride {
    fn from(keep: bool) -> Self {
        if keep {
            ContentTypeOverride::Derived
        } else {
            ContentTypeOverride::Omit
        }
    }
}

impl From<&str> for ContentTypeOverride {
    fn from(value: &str) -> Self {
        ContentTypeOverride::Explicit(value.to_string())
    }
}

/// Options accepted by every verb entry.
///
/// A zero `timeout` disables the timer. `credentials` is a request, not a
/// guarantee: same-origin targets always send credentials.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub submission: SubmissionType,
    pub accept: AcceptType,
    pub content_type: ContentTypeOverride,
    pub timeout: Duration,
    pub use_legacy: bool,
    pub credentials: bool,
    pub parser: Option<Parser>,
    pub on_progress: Option<ProgressFn>,
    pub abort: Option<AbortSignal>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn submission(mut self, submission: SubmissionType) -> Self {
        self.submission = submission;
        self
    }

    pub fn accept(mut self, accept: AcceptType) -> Self {
        self.accept = accept;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<ContentTypeOverride>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    pub fn use_legacy(mut self, use_legacy: bool) -> Self {
        self.use_legacy = use_legacy;
        self
    }

    pub fn credentials(mut self, credentials: bool) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(Value) -> StandardResponse + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn on_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(u64, u64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort = Some(signal);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("submission", &self.submission)
            .field("accept", &self.accept)
            .field("content_type", &self.content_type)
            .field("timeout", &self.timeout)
            .field("use_legacy", &self.use_legacy)
            .field("credentials", &self.credentials)
            .field("parser", &self.parser.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("abort", &self.abort.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = RequestOptions::new();
        assert_eq!(opts.method, Method::Get);
        assert_eq!(opts.submission, SubmissionType::Json);
        assert_eq!(opts.accept, AcceptType::Json);
        assert_eq!(opts.content_type, ContentTypeOverride::Derived);
        assert_eq!(opts.timeout, Duration::ZERO);
        assert!(!opts.use_legacy);
        assert!(!opts.credentials);
    }

    #[test]
    fn content_type_false_means_omit() {
        let opts = RequestOptions::new().content_type(false);
        assert_eq!(opts.content_type, ContentTypeOverride::Omit);
        let opts = RequestOptions::new().content_type("text/csv");
        assert_eq!(opts.content_type, ContentTypeOverride::Explicit("text/csv".into()));
    }
}
