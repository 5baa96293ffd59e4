//! Success/error/complete notifications.
//!
//! Observers are appended and only removed by `clear`. `publish` snapshots
//! each list before calling into it, so an observer may register further
//! observers without deadlocking; those take effect from the next call.

use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::RequestFailure;
use crate::request::RequestSpec;

pub type SuccessObserver = Arc<dyn Fn(&Value, &RequestSpec) + Send + Sync>;
pub type ErrorObserver = Arc<dyn Fn(&RequestFailure, &RequestSpec) + Send + Sync>;
pub type CompleteObserver = Arc<dyn Fn(Result<&Value, &RequestFailure>, &RequestSpec) + Send + Sync>;

#[derive(Default)]
pub struct Hub {
    success: RwLock<Vec<SuccessObserver>>,
    error: RwLock<Vec<ErrorObserver>>,
    complete: RwLock<Vec<CompleteObserver>>,
}

fn snapshot<T: Clone>(lock: &RwLock<Vec<T>>) -> Vec<T> {
    lock.read().unwrap_or_else(|e| e.into_inner()).clone()
}

fn push<T>(lock: &RwLock<Vec<T>>, item: T) {
    lock.write().unwrap_or_else(|e| e.into_inner()).push(item);
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success<F>(&self, observer: F)
    where
        F: Fn(&Value, &RequestSpec) + Send + Sync + 'static,
    {
        push(&self.success, Arc::new(observer));
    }

    pub fn on_error<F>(&self, observer: F)
    where
        F: Fn(&RequestFailure, &RequestSpec) + Send + Sync + 'static,
    {
        push(&self.error, Arc::new(observer));
    }

    pub fn on_complete<F>(&self, observer: F)
    where
        F: Fn(Result<&Value, &RequestFailure>, &RequestSpec) + Send + Sync + 'static,
    {
        push(&self.complete, Arc::new(observer));
    }

    /// Fire the outcome-specific observers, then the complete observers.
    pub fn publish(&self, outcome: &Result<Value, RequestFailure>, spec: &RequestSpec) {
        match outcome {
            Ok(data) => {
                for observer in snapshot(&self.success) {
                    observer(data, spec);
                }
            }
            Err(failure) => {
                for observer in snapshot(&self.error) {
                    observer(failure, spec);
                }
            }
        }
        for observer in snapshot(&self.complete) {
            observer(outcome.as_ref(), spec);
        }
    }

    pub fn clear(&self) {
        self.success.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.error.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.complete.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
