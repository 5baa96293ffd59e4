//! Per-call request construction.
//!
//! # Design
//! `RequestSpec::new` resolves everything a transport needs up front: final
//! URL, body, headers and credential policy. Nothing in a `RequestSpec` changes
//! after construction, so both transports and every observer see the same
//! values.

use std::fmt;
use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::abort::AbortSignal;
use crate::headers::HeaderList;
use crate::http::{Body, Method};
use crate::options::{ContentTypeOverride, Parser, ProgressFn, RequestOptions};
use crate::resolve;
use crate::types::{AcceptType, Payload, SubmissionType};

#[derive(Clone)]
pub struct RequestSpec {
    pub id: Uuid,
    pub url: String,
    pub method: Method,
    pub submission: SubmissionType,
    pub accept: AcceptType,
    pub content_type: ContentTypeOverride,
    pub timeout: Duration,
    pub force_legacy: bool,
    pub send_credentials: bool,
    pub headers: HeaderList,
    pub body: Option<Body>,
    pub parser: Option<Parser>,
    pub on_progress: Option<ProgressFn>,
    pub abort: Option<AbortSignal>,
    pub is_cross_origin: bool,
}

impl RequestSpec {
    pub fn new(url: &str, data: Option<Payload>, options: RequestOptions, origin: Option<&Url>) -> Self {
        let RequestOptions {
            method,
            headers,
            submission,
            accept,
            content_type,
            timeout,
            use_legacy,
            credentials,
            parser,
            on_progress,
            abort,
        } = options;

        let (target, is_cross_origin) = resolve::resolve_target(url, origin);
        let url = resolve::append_query(&target, method, data.as_ref());
        let body = resolve::resolve_body(method, submission, data);
        let headers = HeaderList::derive(submission, &accept, &content_type, &headers);

        Self {
            id: Uuid::new_v4(),
            url,
            method,
            submission,
            accept,
            content_type,
            timeout,
            force_legacy: use_legacy,
            // Same-origin targets always carry credentials, whatever the caller asked for.
            send_credentials: credentials || !is_cross_origin,
            headers,
            body,
            parser,
            on_progress,
            abort,
            is_cross_origin,
        }
    }

    pub fn timeout_enabled(&self) -> bool {
        !self.timeout.is_zero()
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("method", &self.method)
            .field("submission", &self.submission)
            .field("accept", &self.accept)
            .field("timeout", &self.timeout)
            .field("force_legacy", &self.force_legacy)
            .field("send_credentials", &self.send_credentials)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("is_cross_origin", &self.is_cross_origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::CONTENT_TYPE;
    use crate::types::FormData;
    use serde_json::json;

    fn origin() -> Url {
        Url::parse("http://app.local/").unwrap()
    }

    #[test]
    fn get_moves_data_into_query() {
        let spec = RequestSpec::new(
            "/api/users",
            Some(json!({"page": 2}).into()),
            RequestOptions::new(),
            Some(&origin()),
        );
        assert_eq!(spec.url, "http://app.local/api/users?page=2");
        assert!(spec.body.is_none());
    }

    #[test]
    fn post_json_sets_body_and_content_type() {
        let value = json!({"name": "test"});
        let spec = RequestSpec::new(
            "http://api.local/users",
            Some(value.clone().into()),
            RequestOptions::new().method(Method::Post),
            Some(&origin()),
        );
        let Some(Body::Text(text)) = &spec.body else { panic!("expected text body") };
        assert_eq!(serde_json::from_str::<serde_json::Value>(text).unwrap(), value);
        assert_eq!(spec.headers.get(CONTENT_TYPE), Some("application/json"));
    }

    #[test]
    fn form_submission_has_no_content_type() {
        let spec = RequestSpec::new(
            "/upload",
            Some(FormData::new().text("a", "b").into()),
            RequestOptions::new()
                .method(Method::Post)
                .submission(SubmissionType::Form)
                .header("Content-Type", "application/json"),
            Some(&origin()),
        );
        assert!(!spec.headers.contains(CONTENT_TYPE));
        assert!(matches!(spec.body, Some(Body::Multipart(_))));
    }

    #[test]
    fn same_origin_forces_credentials() {
        let spec = RequestSpec::new("/me", None, RequestOptions::new().credentials(false), Some(&origin()));
        assert!(!spec.is_cross_origin);
        assert!(spec.send_credentials);
    }

    #[test]
    fn cross_origin_respects_caller_credentials() {
        let spec = RequestSpec::new("http://cdn.local/x", None, RequestOptions::new(), Some(&origin()));
        assert!(spec.is_cross_origin);
        assert!(!spec.send_credentials);

        let spec = RequestSpec::new(
            "http://cdn.local/x",
            None,
            RequestOptions::new().credentials(true),
            Some(&origin()),
        );
        assert!(spec.send_credentials);
    }

    #[test]
    fn each_spec_gets_a_fresh_id() {
        let a = RequestSpec::new("/x", None, RequestOptions::new(), None);
        let b = RequestSpec::new("/x", None, RequestOptions::new(), None);
        assert_ne!(a.id, b.id);
    }
}
