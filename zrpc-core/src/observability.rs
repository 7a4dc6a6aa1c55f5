//! Logging, tracing and metrics setup
//!
//! zrpc instruments itself with `tracing` spans and events and with
//! OpenTelemetry instruments obtained from `opentelemetry::global`. Nothing
//! is exported until the application installs a pipeline, which is what
//! this module does.
//!
//! Two entry points:
//!
//! - [`init_logging`]: JSON logs on stdout, filtered by `RUST_LOG`
//! - [`init_observability`]: the same logs plus OTLP export of spans and
//!   metrics to a collector
//!
//! Both are meant to be called once, at process start.
//!
//! ```rust,no_run
//! use zrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("calculator")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     zrpc_core::init_observability(config).expect("observability");
//!     // serve...
//!     zrpc_core::shutdown_observability();
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint (default `http://localhost:4317`)
//! - `RUST_LOG`: filter directives; takes precedence over the configured level

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Handles kept for shutdown; the global slots never drop their providers.
static TRACER_PROVIDER: Mutex<Option<SdkTracerProvider>> = Mutex::new(None);
static METER_PROVIDER: Mutex<Option<SdkMeterProvider>> = Mutex::new(None);

type InitResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(30);

/// What to export, and where
///
/// Defaults: service `"zrpc"`, the crate version, endpoint from
/// `OTEL_EXPORTER_OTLP_ENDPOINT`, traces and metrics on, level from
/// `RUST_LOG` or `"info"`.
///
/// ```rust
/// use zrpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("calculator")
///     .with_version("1.2.3")
///     .with_metrics(false);
/// assert!(!config.enable_metrics);
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Reported as `service.name`
    pub service_name: String,
    /// Reported as `service.version`
    pub service_version: String,
    /// OTLP/gRPC collector endpoint
    pub otlp_endpoint: String,
    pub enable_traces: bool,
    pub enable_metrics: bool,
    /// Emit JSON logs on stdout
    pub enable_logs: bool,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "zrpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            enable_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub fn with_logs(mut self, enable: bool) -> Self {
        self.enable_logs = enable;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the OTLP pipeline and the log subscriber
///
/// Fails if an exporter cannot be built or if a global subscriber is
/// already installed.
pub fn init_observability(config: ObservabilityConfig) -> InitResult<()> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "OpenTelemetry initialized"
    );
    Ok(())
}

/// Install only the JSON log subscriber, without any exporter
pub fn init_logging(log_level: &str) -> InitResult<()> {
    let config = ObservabilityConfig::new("zrpc")
        .with_traces(false)
        .with_metrics(false)
        .with_log_level(log_level);
    init_subscriber(&config, None)
}

fn init_tracer(config: &ObservabilityConfig) -> InitResult<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    keep_tracer_provider(provider.clone());
    global::set_tracer_provider(provider);
    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> InitResult<()> {
    use opentelemetry_sdk::metrics::PeriodicReader;

    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(METRICS_EXPORT_INTERVAL)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    keep_meter_provider(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn keep_tracer_provider(provider: SdkTracerProvider) {
    if let Ok(mut slot) = TRACER_PROVIDER.lock() {
        *slot = Some(provider);
    }
}

fn keep_meter_provider(provider: SdkMeterProvider) {
    if let Ok(mut slot) = METER_PROVIDER.lock() {
        *slot = Some(provider);
    }
}

fn init_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> InitResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = config.enable_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });
    let telemetry_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

/// Flush and stop exporters
///
/// Pending spans and metrics are exported before this returns. Calling it
/// again, or without `init_observability`, does nothing.
pub fn shutdown_observability() {
    tracing::info!("Shutting down OpenTelemetry");

    let tracer_provider = TRACER_PROVIDER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(provider) = tracer_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Tracer provider shutdown failed");
        }
    }

    let meter_provider = METER_PROVIDER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(provider) = meter_provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Meter provider shutdown failed");
        }
    }
}
