//! Server metrics
//!
//! OpenTelemetry instruments recorded by the engine when observability is
//! enabled on the builder. They are obtained from the global meter provider,
//! so they are no-ops until `zrpc_core::init_observability` installs one.
//!
//! - **requests_total** / **request_duration**: per call, by `method` and `status`
//! - **notifications_total**: calls that carried no id, by `method`
//! - **batch_size**: items per batch, by `mode`
//! - **errors_total**: error responses, by `code`
//! - **messages_total**: inbound transport messages, by `outcome`
//!   (`reply` or `no_reply`)

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

pub struct ServerMetrics {
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub notifications_total: Counter<u64>,
    pub batch_size: Histogram<u64>,
    pub errors_total: Counter<u64>,
    pub messages_total: Counter<u64>,
}

impl ServerMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        // The global meter API wants a 'static scope name; one leak per server.
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("zrpc.server.requests.total")
                .with_description("Total number of calls dispatched")
                .build(),
            request_duration: meter
                .f64_histogram("zrpc.server.request.duration")
                .with_description("Call processing duration in seconds")
                .build(),
            notifications_total: meter
                .u64_counter("zrpc.server.notifications.total")
                .with_description("Total number of notifications dispatched")
                .build(),
            batch_size: meter
                .u64_histogram("zrpc.server.batch.size")
                .with_description("Number of items in batch messages")
                .build(),
            errors_total: meter
                .u64_counter("zrpc.server.errors.total")
                .with_description("Total number of error responses produced")
                .build(),
            messages_total: meter
                .u64_counter("zrpc.server.messages.total")
                .with_description("Total number of inbound transport messages")
                .build(),
        }
    }

    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    pub fn record_notification(&self, method: &str) {
        self.notifications_total
            .add(1, &[KeyValue::new("method", method.to_string())]);
    }

    pub fn record_batch(&self, size: u64, mode: &str) {
        self.batch_size
            .record(size, &[KeyValue::new("mode", mode.to_string())]);
    }

    pub fn record_error(&self, code: i32) {
        self.errors_total
            .add(1, &[KeyValue::new("code", i64::from(code))]);
    }

    pub fn record_message(&self, replied: bool) {
        let outcome = if replied { "reply" } else { "no_reply" };
        self.messages_total
            .add(1, &[KeyValue::new("outcome", outcome)]);
    }
}
