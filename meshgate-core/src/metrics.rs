use std::sync::Arc;
use std::time::Duration;

/// Injection seam for request-scoped telemetry.
///
/// The core never talks to an APM agent directly; the monitor filters and
/// the breaker report through this trait and the host wires a real sink.
pub trait MetricsSink: Send + Sync {
    fn request_start(&self, service_id: &str, path: &str);

    fn request_finish(&self, service_id: &str, path: &str, status: u16, elapsed: Duration);

    fn breaker_transition(&self, key: &str, from: &'static str, to: &'static str);

    fn rate_limited(&self, key: &str);
}

/// Default sink: drops everything.
#[derive(Debug, Default)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn request_start(&self, _service_id: &str, _path: &str) {}

    fn request_finish(&self, _service_id: &str, _path: &str, _status: u16, _elapsed: Duration) {}

    fn breaker_transition(&self, _key: &str, _from: &'static str, _to: &'static str) {}

    fn rate_limited(&self, _key: &str) {}
}

/// Sink that forwards everything to the structured log stream.
#[derive(Debug, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn request_start(&self, service_id: &str, path: &str) {
        tracing::debug!(event = "request_start", service = %service_id, path = %path);
    }

    fn request_finish(&self, service_id: &str, path: &str, status: u16, elapsed: Duration) {
        tracing::info!(
            event = "request_finish",
            service = %service_id,
            path = %path,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn breaker_transition(&self, key: &str, from: &'static str, to: &'static str) {
        tracing::info!(event = "breaker_metric", breaker = %key, from = from, to = to);
    }

    fn rate_limited(&self, key: &str) {
        tracing::info!(event = "rate_limited", key = %key);
    }
}

pub fn noop_metrics() -> Arc<dyn MetricsSink> {
    Arc::new(NoopMetrics)
}
