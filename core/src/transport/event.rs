//! Event-driven request primitive used by the legacy transport.
//!
//! # Design
//! `EventRequest` exposes the open/send/abort surface and handler slots of
//! a classic callback-based HTTP object. `send` hands the exchange to a
//! worker thread, which reports back through an unbounded channel:
//! upload progress, headers, loading, then exactly one terminal event
//! (load, error or timeout). `dispatch` pumps those events into the
//! registered handlers until a terminal event arrives or the abort signal
//! fires, whichever comes first.
//!
//! Handlers receive `&mut EventRequest` so they can read the response and
//! call `clear_handlers`; once cleared, no further handler runs.

use std::future::pending;
use std::io::{Cursor, Read};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use super::read_body;
use crate::abort::AbortSignal;
use crate::headers::CONTENT_TYPE;
use crate::http::{Body, Method, WireBody};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent,
    Opened,
    HeadersReceived,
    Loading,
    Done,
}

#[derive(Debug)]
enum Event {
    UploadProgress { loaded: u64, total: u64 },
    Headers { status: u16, status_text: String },
    Loading,
    Load { response_text: String },
    Error(String),
    Timeout,
}

impl Event {
    fn is_terminal(&self) -> bool {
        matches!(self, Event::Load { .. } | Event::Error(_) | Event::Timeout)
    }
}

pub type Handler = Box<dyn FnMut(&mut EventRequest) + Send>;
pub type ProgressHandler = Box<dyn FnMut(u64, u64) + Send>;

#[derive(Clone, Copy)]
enum Slot {
    ReadyStateChange,
    Error,
    Abort,
    Timeout,
}

pub struct EventRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    with_credentials: bool,
    timeout: Duration,
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    response_text: String,
    error: Option<String>,
    events: Option<mpsc::UnboundedReceiver<Event>>,
    detached: bool,
    pub on_upload_progress: Option<ProgressHandler>,
    pub on_ready_state_change: Option<Handler>,
    pub on_error: Option<Handler>,
    pub on_abort: Option<Handler>,
    pub on_timeout: Option<Handler>,
}

impl Default for EventRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRequest {
    pub fn new() -> Self {
        Self {
            method: Method::Get,
            url: String::new(),
            headers: Vec::new(),
            with_credentials: false,
            timeout: Duration::ZERO,
            ready_state: ReadyState::Unsent,
            status: 0,
            status_text: String::new(),
            response_text: String::new(),
            error: None,
            events: None,
            detached: false,
            on_upload_progress: None,
            on_ready_state_change: None,
            on_error: None,
            on_abort: None,
            on_timeout: None,
        }
    }

    /// A request that already reached `Done` with the given response.
    #[cfg(test)]
    pub(crate) fn finished(status: u16, status_text: &str, response_text: &str) -> Self {
        Self {
            ready_state: ReadyState::Done,
            status,
            status_text: status_text.to_string(),
            response_text: response_text.to_string(),
            ..Self::new()
        }
    }

    pub fn open(&mut self, method: Method, url: &str) {
        self.method = method;
        self.url = url.to_string();
        self.ready_state = ReadyState::Opened;
        self.fire(Slot::ReadyStateChange);
    }

    pub fn set_with_credentials(&mut self, with_credentials: bool) {
        self.with_credentials = with_credentials;
    }

    pub fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Zero disables the timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Start the exchange on a worker thread. Ignored unless the request is
    /// open and not yet sent.
    pub fn send(&mut self, body: Option<&Body>) {
        if self.ready_state != ReadyState::Opened || self.events.is_some() {
            return;
        }
        let wire = body.map(Body::to_wire);
        let mut headers = self.headers.clone();
        if let Some(content_type) = wire.as_ref().and_then(|w| w.content_type.clone()) {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(CONTENT_TYPE));
            headers.push((CONTENT_TYPE.to_string(), content_type));
        }
        let job = Job {
            method: self.method,
            url: self.url.clone(),
            headers,
            with_credentials: self.with_credentials,
            timeout: self.timeout,
            body: wire,
        };
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(rx);
        thread::spawn(move || run_job(job, tx));
    }

    /// Stop listening for the exchange and fire the abort handler.
    pub fn abort(&mut self) {
        if self.ready_state == ReadyState::Done || self.ready_state == ReadyState::Unsent {
            return;
        }
        self.events = None;
        self.ready_state = ReadyState::Done;
        self.fire(Slot::Abort);
    }

    /// Pump events into the handlers until a terminal event or an abort.
    pub async fn dispatch(&mut self, abort: Option<&AbortSignal>) {
        let Some(mut rx) = self.events.take() else {
            return;
        };
        let aborted = async {
            match abort {
                Some(signal) => signal.aborted().await,
                None => pending::<()>().await,
            }
        };
        tokio::pin!(aborted);

        loop {
            tokio::select! {
                biased;
                _ = &mut aborted => {
                    drop(rx);
                    self.abort();
                    return;
                }
                event = rx.recv() => match event {
                    Some(event) => {
                        let terminal = event.is_terminal();
                        self.handle(event);
                        if terminal {
                            return;
                        }
                    }
                    None => {
                        self.handle(Event::Error("worker exited without a response".to_string()));
                        return;
                    }
                },
            }
        }
    }

    /// Detach every handler, including the upload progress listener.
    pub fn clear_handlers(&mut self) {
        self.on_upload_progress = None;
        self.on_ready_state_change = None;
        self.on_error = None;
        self.on_abort = None;
        self.on_timeout = None;
        self.detached = true;
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn with_credentials(&self) -> bool {
        self.with_credentials
    }

    fn handle(&mut self, event: Event) {
        trace!(?event, "legacy event");
        match event {
            Event::UploadProgress { loaded, total } => {
                if let Some(on_progress) = self.on_upload_progress.as_mut() {
                    on_progress(loaded, total);
                }
            }
            Event::Headers { status, status_text } => {
                self.status = status;
                self.status_text = status_text;
                self.ready_state = ReadyState::HeadersReceived;
                self.fire(Slot::ReadyStateChange);
            }
            Event::Loading => {
                self.ready_state = ReadyState::Loading;
                self.fire(Slot::ReadyStateChange);
            }
            Event::Load { response_text } => {
                self.response_text = response_text;
                self.ready_state = ReadyState::Done;
                self.fire(Slot::ReadyStateChange);
            }
            Event::Error(message) => {
                self.error = Some(message);
                self.ready_state = ReadyState::Done;
                self.fire(Slot::Error);
            }
            Event::Timeout => {
                self.ready_state = ReadyState::Done;
                self.fire(Slot::Timeout);
            }
        }
    }

    fn slot(&mut self, slot: Slot) -> &mut Option<Handler> {
        match slot {
            Slot::ReadyStateChange => &mut self.on_ready_state_change,
            Slot::Error => &mut self.on_error,
            Slot::Abort => &mut self.on_abort,
            Slot::Timeout => &mut self.on_timeout,
        }
    }

    fn fire(&mut self, slot: Slot) {
        let Some(mut handler) = self.slot(slot).take() else {
            return;
        };
        handler(self);
        if !self.detached && self.slot(slot).is_none() {
            *self.slot(slot) = Some(handler);
        }
    }
}

struct Job {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    with_credentials: bool,
    timeout: Duration,
    body: Option<WireBody>,
}

/// Reports every chunk ureq pulls from the body as upload progress.
struct ProgressReader {
    inner: Cursor<Vec<u8>>,
    loaded: u64,
    total: u64,
    tx: mpsc::UnboundedSender<Event>,
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.loaded += n as u64;
            let _ = self.tx.send(Event::UploadProgress {
                loaded: self.loaded,
                total: self.total,
            });
        }
        Ok(n)
    }
}

fn run_job(job: Job, tx: mpsc::UnboundedSender<Event>) {
    trace!(url = %job.url, with_credentials = job.with_credentials, "legacy worker started");
    let mut config = ureq::Agent::config_builder().http_status_as_error(false);
    if !job.timeout.is_zero() {
        config = config.timeout_global(Some(job.timeout));
    }
    let agent = config.build().new_agent();

    let mut builder = ureq::http::Request::builder()
        .method(job.method.as_str())
        .uri(job.url.as_str());
    for (name, value) in &job.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let result = match job.body {
        Some(wire) => {
            let total = wire.bytes.len() as u64;
            let mut reader = ProgressReader {
                inner: Cursor::new(wire.bytes),
                loaded: 0,
                total,
                tx: tx.clone(),
            };
            match builder.body(ureq::SendBody::from_reader(&mut reader)) {
                Ok(request) => agent.run(request),
                Err(e) => {
                    let _ = tx.send(Event::Error(e.to_string()));
                    return;
                }
            }
        }
        None => match builder.body(()) {
            Ok(request) => agent.run(request),
            Err(e) => {
                let _ = tx.send(Event::Error(e.to_string()));
                return;
            }
        },
    };

    let event = match result {
        Ok(mut response) => {
            let status = response.status();
            let _ = tx.send(Event::Headers {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
            let _ = tx.send(Event::Loading);
            match read_body(response.body_mut()) {
                Ok(response_text) => Event::Load { response_text },
                Err(ureq::Error::Timeout(_)) => Event::Timeout,
                Err(e) => Event::Error(e.to_string()),
            }
        }
        Err(ureq::Error::Timeout(_)) => Event::Timeout,
        Err(e) => Event::Error(e.to_string()),
    };
    let _ = tx.send(event);
}
