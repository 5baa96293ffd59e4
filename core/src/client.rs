//! Client context and verb entries.
//!
//! # Design
//! `Client` owns the only state that outlives a call: the client-wide
//! response parser and the notification hub. Tests build isolated clients
//! with `Client::new`; the free functions at the crate root use a lazily
//! initialised process-wide instance whose state `reset` wipes.
//!
//! Each verb fixes the method and delegates to `fetch`, which builds a
//! `RequestSpec`, picks a transport, runs it and publishes the outcome.

use std::sync::{Arc, OnceLock, RwLock};

use serde_json::Value;
use tracing::{debug, debug_span, warn, Instrument};

use crate::config::ClientConfig;
use crate::error::RequestFailure;
use crate::http::Method;
use crate::notify::Hub;
use crate::options::{Parser, RequestOptions};
use crate::request::RequestSpec;
use crate::transport::{self, select_transport};
use crate::types::{FormData, Payload, StandardResponse, SubmissionType};

static GLOBAL: OnceLock<Client> = OnceLock::new();

pub struct Client {
    config: ClientConfig,
    parser: RwLock<Option<Parser>>,
    hub: Hub,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            parser: RwLock::new(None),
            hub: Hub::new(),
        }
    }

    /// The process-wide client, configured from the environment on first use.
    pub fn global() -> &'static Client {
        GLOBAL.get_or_init(|| {
            let config = ClientConfig::from_env().unwrap_or_else(|e| {
                warn!(error = %e, "ignoring invalid client environment");
                ClientConfig::default()
            });
            Client::new(config)
        })
    }

    /// Drop the client-wide parser and every registered observer.
    pub fn reset(&self) {
        self.clear_parser();
        self.hub.clear();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Install the parser used by JSON calls that bring none of their own.
    pub fn set_parser<F>(&self, parser: F)
    where
        F: Fn(Value) -> StandardResponse + Send + Sync + 'static,
    {
        *self.parser.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(parser));
    }

    pub fn clear_parser(&self) {
        *self.parser.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn global_parser(&self) -> Option<Parser> {
        self.parser.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn fetch(
        &self,
        url: &str,
        data: Option<Payload>,
        options: RequestOptions,
    ) -> Result<Value, RequestFailure> {
        let spec = RequestSpec::new(url, data, options, self.config.origin.as_ref());
        let kind = select_transport(self.config.capabilities(), spec.force_legacy);
        let span = debug_span!(
            "request",
            id = %spec.id,
            method = %spec.method,
            url = %spec.url,
            transport = kind.as_str()
        );

        let outcome = transport::execute(kind, &spec, self.global_parser())
            .instrument(span.clone())
            .await;
        span.in_scope(|| match &outcome {
            Ok(_) => debug!("request succeeded"),
            Err(failure) => debug!(status = failure.status, code = %failure.code, "request failed"),
        });

        self.hub.publish(&outcome, &spec);
        outcome
    }

    pub async fn get(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Get)).await
    }

    pub async fn head(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Head)).await
    }

    pub async fn post(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Post)).await
    }

    pub async fn put(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Put)).await
    }

    pub async fn patch(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Patch)).await
    }

    pub async fn delete(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Delete)).await
    }

    pub async fn options(&self, url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
        self.fetch(url, data, options.method(Method::Options)).await
    }

    /// POST a multipart form; the submission type is always `form`.
    pub async fn upload(&self, url: &str, form: FormData, options: RequestOptions) -> Result<Value, RequestFailure> {
        let options = options.method(Method::Post).submission(SubmissionType::Form);
        self.fetch(url, Some(Payload::Form(form)), options).await
    }
}

pub async fn fetch(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().fetch(url, data, options).await
}

pub async fn get(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().get(url, data, options).await
}

pub async fn head(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().head(url, data, options).await
}

pub async fn post(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().post(url, data, options).await
}

pub async fn put(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().put(url, data, options).await
}

pub async fn patch(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().patch(url, data, options).await
}

pub async fn delete(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().delete(url, data, options).await
}

pub async fn options(url: &str, data: Option<Payload>, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().options(url, data, options).await
}

pub async fn upload(url: &str, form: FormData, options: RequestOptions) -> Result<Value, RequestFailure> {
    Client::global().upload(url, form, options).await
}

/// Install the parser of the process-wide client.
pub fn set_parser<F>(parser: F)
where
    F: Fn(Value) -> StandardResponse + Send + Sync + 'static,
{
    Client::global().set_parser(parser);
}

pub fn clear_parser() {
    Client::global().clear_parser();
}

/// Drop the process-wide parser and observers.
pub fn reset() {
    Client::global().reset();
}

pub fn on_success<F>(observer: F)
where
    F: Fn(&Value, &RequestSpec) + Send + Sync + 'static,
{
    Client::global().hub().on_success(observer);
}

pub fn on_error<F>(observer: F)
where
    F: Fn(&RequestFailure, &RequestSpec) + Send + Sync + 'static,
{
    Client::global().hub().on_error(observer);
}

pub fn on_complete<F>(observer: F)
where
    F: Fn(Result<&Value, &RequestFailure>, &RequestSpec) + Send + Sync + 'static,
{
    Client::global().hub().on_complete(observer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn reset_clears_parser_and_observers() {
        let client = Client::default();
        client.set_parser(|body| StandardResponse::ok(body));
        client.hub().on_complete(|_, _| {});
        assert!(client.global_parser().is_some());
        client.reset();
        assert!(client.global_parser().is_none());
    }

    #[tokio::test]
    async fn failed_call_notifies_error_then_complete() {
        let client = Client::default();
        let errors = Arc::new(AtomicUsize::new(0));
        let completes = Arc::new(AtomicUsize::new(0));
        let e = errors.clone();
        client.hub().on_error(move |failure, _| {
            assert_eq!(failure.kind, FailureKind::Transport);
            e.fetch_add(1, Ordering::SeqCst);
        });
        let c = completes.clone();
        client.hub().on_complete(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        let err = client.get("/relative/only", None, RequestOptions::new()).await.unwrap_err();
        assert_eq!(err.status, 500);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(completes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn global_client_is_a_singleton() {
        assert!(std::ptr::eq(Client::global(), Client::global()));
    }
}
