//! Legacy transport over the event-driven `EventRequest`.
//!
//! Every handler registered here starts by clearing all handlers, so the
//! first terminal event settles the call and nothing after it can.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use super::event::{EventRequest, Handler, ReadyState};
use super::ResponseRules;
use crate::error::RequestFailure;
use crate::options::Parser;
use crate::request::RequestSpec;

/// First-writer-wins outcome slot shared by the handlers.
#[derive(Clone, Default)]
struct Settlement(Arc<Mutex<Option<Result<Value, RequestFailure>>>>);

impl Settlement {
    fn settle(&self, outcome: Result<Value, RequestFailure>) {
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(outcome);
        }
    }

    fn take(&self) -> Option<Result<Value, RequestFailure>> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

fn on_load(rules: ResponseRules, settlement: Settlement) -> Handler {
    Box::new(move |req: &mut EventRequest| {
        if req.ready_state() != ReadyState::Done {
            return;
        }
        req.clear_handlers();
        let body = rules.decode(req.response_text().to_string());
        debug!(status = req.status(), "response received");
        settlement.settle(rules.settle(req.status(), Some(req.status_text()), body));
    })
}

fn on_failure(settlement: Settlement, failure: fn(&EventRequest) -> RequestFailure) -> Handler {
    Box::new(move |req: &mut EventRequest| {
        req.clear_handlers();
        settlement.settle(Err(failure(req)));
    })
}

pub async fn execute(spec: &RequestSpec, global_parser: Option<Parser>) -> Result<Value, RequestFailure> {
    let settlement = Settlement::default();
    let mut req = EventRequest::new();

    req.open(spec.method, &spec.url);
    req.set_with_credentials(spec.send_credentials);
    for (name, value) in spec.headers.iter() {
        req.set_request_header(name, value);
    }
    if let Some(on_progress) = spec.on_progress.clone() {
        req.on_upload_progress = Some(Box::new(move |loaded, total| on_progress(loaded, total)));
    }

    req.on_ready_state_change = Some(on_load(ResponseRules::new(spec, global_parser), settlement.clone()));
    req.on_error = Some(on_failure(settlement.clone(), |req| {
        RequestFailure::transport(req.error().map(str::to_string))
    }));
    req.on_abort = Some(on_failure(settlement.clone(), |_| {
        debug!("aborted");
        RequestFailure::aborted()
    }));
    if spec.timeout_enabled() {
        req.set_timeout(spec.timeout);
        req.on_timeout = Some(on_failure(settlement.clone(), |_| {
            debug!("timed out");
            RequestFailure::timeout()
        }));
    }

    req.send(spec.body.as_ref());
    req.dispatch(spec.abort.as_ref()).await;

    settlement
        .take()
        .unwrap_or_else(|| Err(RequestFailure::transport(None)))
}
