//! Client metrics
//!
//! - **requests_total** / **request_duration**: by `method` and `status`
//! - **errors_total**: by `error_type`
//! - **batch_size**: items per batch sent
//!
//! Enabled with `ZrpcClient::with_metrics`; exported once a meter provider
//! is installed with `zrpc_core::init_observability`.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

pub struct ClientMetrics {
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
    pub batch_size: Histogram<u64>,
}

impl ClientMetrics {
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("zrpc.client.requests.total")
                .with_description("Total number of requests sent")
                .build(),
            request_duration: meter
                .f64_histogram("zrpc.client.request.duration")
                .with_description("Request round trip in seconds")
                .build(),
            errors_total: meter
                .u64_counter("zrpc.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            batch_size: meter
                .u64_histogram("zrpc.client.batch.size")
                .with_description("Number of items in batches sent")
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

    pub fn record_error(&self, error_type: &str) {
        self.errors_total
            .add(1, &[KeyValue::new("error_type", error_type.to_string())]);
    }

    pub fn record_batch(&self, size: u64) {
        self.batch_size.record(size, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_without_provider() {
        let metrics = ClientMetrics::new("test-client");
        metrics.record_request("subtract", "success", 0.003);
        metrics.record_error("transport");
        metrics.record_batch(5);
    }
}
