//! Per-call dispatch
//!
//! The dispatcher turns one validated (or rejected) call into at most one
//! response:
//!
//! - a rejected envelope always yields its Invalid Request error
//! - a request yields a success or error response carrying its id
//! - a notification yields nothing, whatever happened; failures are logged

use crate::metrics::ServerMetrics;
use crate::router::Router;
use std::sync::Arc;
use std::time::Instant;
use zrpc_core::{Call, Error, InvalidCall, JsonRpcResponse};

/// Routes calls and shapes their outcome into responses
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self {
            router,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Option<Arc<ServerMetrics>>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn metrics(&self) -> Option<&ServerMetrics> {
        self.metrics.as_deref()
    }

    /// Dispatch one item of a message
    pub async fn dispatch(&self, item: Result<Call, InvalidCall>) -> Option<JsonRpcResponse> {
        match item {
            Ok(call) => self.dispatch_call(call).await,
            Err(invalid) => {
                tracing::debug!(id = %invalid.id, error = %invalid.error, "Rejected call envelope");
                if let Some(metrics) = self.metrics() {
                    metrics.record_error(invalid.error.code);
                }
                Some(invalid.into_response())
            }
        }
    }

    /// Run a well-formed call
    pub async fn dispatch_call(&self, call: Call) -> Option<JsonRpcResponse> {
        let (method, params, id) = call.into_parts();
        let start = Instant::now();
        let outcome = self.router.route(&method, params).await;
        let elapsed = start.elapsed().as_secs_f64();

        let Some(id) = id else {
            if let Some(metrics) = self.metrics() {
                metrics.record_notification(&method);
            }
            if let Err(e) = outcome {
                log_notification_failure(&method, &e);
            }
            return None;
        };

        let response = match outcome {
            Ok(result) => JsonRpcResponse::success(result, id),
            Err(e) => {
                let error = e.to_error_data();
                tracing::debug!(method = %method, id = %id, error = %error, "Call failed");
                if let Some(metrics) = self.metrics() {
                    metrics.record_error(error.code);
                }
                JsonRpcResponse::error(error, id)
            }
        };

        if let Some(metrics) = self.metrics() {
            let status = if response.is_success() { "success" } else { "error" };
            metrics.record_request(&method, status, elapsed);
        }
        Some(response)
    }
}

fn log_notification_failure(method: &str, error: &Error) {
    match error {
        Error::MethodNotFound(_) | Error::InvalidParams(_) => {
            tracing::debug!(method = %method, error = %error, "Notification failed")
        }
        _ => tracing::warn!(method = %method, error = %error, "Notification failed"),
    }
}
