//! Metrics collection and exposition.
//!
//! # Metrics
//! - `requests_total` (counter): completed requests by status text, method and URI
//! - `request_duration_seconds` (histogram): latency distribution, same labels
//!
//! Both carry a constant `service` label. Each service name gets its own
//! Prometheus recorder; registering a name twice in one process is a startup
//! error rather than a panic on the request path.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics::{Key, KeyName, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;

pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";

static METADATA: Metadata<'static> =
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Service names registered in this process.
static REGISTERED: Mutex<Vec<String>> = Mutex::new(Vec::new());

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics already registered for service '{0}'")]
    AlreadyRegistered(String),

    #[error("invalid histogram buckets: {0}")]
    Buckets(#[from] BuildError),
}

/// Request metrics for one service, backed by a dedicated Prometheus recorder.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<Inner>,
}

struct Inner {
    service: String,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl Metrics {
    /// Register request metrics for `service_name`.
    ///
    /// Fails if the name was already registered in this process.
    pub fn register(service_name: &str, buckets: &[f64]) -> Result<Self, MetricsError> {
        let mut registered = REGISTERED.lock().unwrap_or_else(PoisonError::into_inner);
        if registered.iter().any(|name| name == service_name) {
            return Err(MetricsError::AlreadyRegistered(service_name.to_string()));
        }

        let recorder = PrometheusBuilder::new()
            .add_global_label("service", service_name)
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                buckets,
            )?
            .build_recorder();

        recorder.describe_counter(
            KeyName::from_const_str(REQUESTS_TOTAL),
            None,
            "Number of completed requests partitioned by status code, method and URI.".into(),
        );
        recorder.describe_histogram(
            KeyName::from_const_str(REQUEST_DURATION_SECONDS),
            None,
            "Duration of requests completion partitioned by status code, method and URI.".into(),
        );

        let handle = recorder.handle();
        registered.push(service_name.to_string());

        tracing::debug!(service = %service_name, ?buckets, "Request metrics registered");

        Ok(Self {
            inner: Arc::new(Inner {
                service: service_name.to_string(),
                recorder,
                handle,
            }),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service
    }

    /// Record one completed request.
    pub fn record_request(&self, status: StatusCode, method: &Method, path: &str, elapsed: Duration) {
        let labels = vec![
            Label::new("code", status.canonical_reason().unwrap_or("Unknown")),
            Label::new("method", method.to_string()),
            Label::new("uri", path.to_string()),
        ];

        let counter_key = Key::from_parts(REQUESTS_TOTAL, labels.clone());
        self.inner
            .recorder
            .register_counter(&counter_key, &METADATA)
            .increment(1);

        let histogram_key = Key::from_parts(REQUEST_DURATION_SECONDS, labels);
        self.inner
            .recorder
            .register_histogram(&histogram_key, &METADATA)
            .record(elapsed.as_secs_f64());
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.inner.handle.render()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("service", &self.inner.service)
            .finish()
    }
}
