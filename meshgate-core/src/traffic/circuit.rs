use crate::clock::Clock;
use crate::metrics::MetricsSink;
use crate::traffic::window::{SlidingWindow, WindowStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    fn as_u8(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Breaker tuning, deserialized from the rule's `circuit_breaker_filter`
/// config payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitBreakerConfig {
    /// Window failure rate (percent) that trips CLOSED → OPEN.
    pub failure_threshold_percentage: u32,
    /// Minimum in-window samples before the rate is meaningful.
    pub min_request_threshold: u64,
    /// OPEN → HALF_OPEN dwell, wall-clock.
    pub timeout_ms: u64,
    pub half_open_max_requests: u32,
    pub half_open_success_threshold: u32,
    pub window_size_ms: u64,
    pub bucket_count: u32,
    /// Body served with status 200 while OPEN, instead of the 503 error
    /// shape.
    pub fallback_response: Option<String>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold_percentage: 50,
            min_request_threshold: 20,
            timeout_ms: 10_000,
            half_open_max_requests: 5,
            half_open_success_threshold: 3,
            window_size_ms: 60_000,
            bucket_count: 10,
            fallback_response: None,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=100).contains(&self.failure_threshold_percentage) {
            return Err("failureThresholdPercentage must be in [1, 100]".into());
        }
        if self.min_request_threshold < 1 {
            return Err("minRequestThreshold must be at least 1".into());
        }
        if self.timeout_ms < 1000 {
            return Err("timeoutMs must be at least 1000".into());
        }
        if self.half_open_max_requests < 1 {
            return Err("halfOpenMaxRequests must be at least 1".into());
        }
        if self.half_open_success_threshold > self.half_open_max_requests {
            return Err("halfOpenSuccessThreshold must not exceed halfOpenMaxRequests".into());
        }
        if self.window_size_ms < 10_000 {
            return Err("windowSizeMs must be at least 10000".into());
        }
        if !(2..=100).contains(&self.bucket_count) {
            return Err("bucketCount must be in [2, 100]".into());
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct BreakerInner {
    failure_count: u64,
    success_count: u64,
    request_count: u64,
    half_open_admitted: u32,
    last_failure_time: u64,
    state_change_time: u64,
}

/// Three-state circuit breaker over a sliding window.
///
/// Transitions are serialized by the inner mutex; `state()` reads an atomic
/// mirror so the hot admission fast path (CLOSED) takes no lock. An
/// admission decision and any transition it triggers are observed as atomic
/// by subsequent admissions.
pub struct CircuitBreaker {
    key: String,
    config: CircuitBreakerConfig,
    window: SlidingWindow,
    state: AtomicU8,
    inner: Mutex<BreakerInner>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn MetricsSink>,
}

impl CircuitBreaker {
    pub fn new(
        key: impl Into<String>,
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let window = SlidingWindow::new(config.window_size_ms, config.bucket_count, clock.clone());
        let now = clock.now_millis();
        Self {
            key: key.into(),
            config,
            window,
            state: AtomicU8::new(CircuitState::Closed.as_u8()),
            inner: Mutex::new(BreakerInner {
                state_change_time: now,
                ..BreakerInner::default()
            }),
            clock,
            sink,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Admission check. Never blocks on I/O; OPEN admits only after the
    /// dwell elapsed (promoting to HALF_OPEN), HALF_OPEN admits a bounded
    /// number of probes.
    pub fn allow_request(&self) -> bool {
        if self.state() == CircuitState::Closed {
            return true;
        }

        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        // Re-read under the lock: another admission may have transitioned.
        match self.state() {
            CircuitState::Closed => true,

            CircuitState::Open => {
                let now = self.clock.now_millis();
                if now.saturating_sub(inner.state_change_time) >= self.config.timeout_ms {
                    self.transition(&mut inner, CircuitState::Open, CircuitState::HalfOpen, "cooldown_expired");
                    inner.half_open_admitted += 1;
                    true
                } else {
                    false
                }
            }

            CircuitState::HalfOpen => {
                if inner.half_open_admitted < self.config.half_open_max_requests {
                    inner.half_open_admitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record the outcome of an admitted request.
    pub fn record_result(&self, success: bool, response_time_ms: u64) {
        self.window.add_sample(success, response_time_ms);

        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        inner.request_count += 1;
        if success {
            inner.success_count += 1;
        } else {
            inner.failure_count += 1;
            inner.last_failure_time = self.clock.now_millis();
        }

        match self.state() {
            CircuitState::Closed => {
                if success {
                    inner.failure_count = 0;
                } else {
                    let stats = self.window.stats();
                    if stats.total_requests >= self.config.min_request_threshold
                        && stats.failure_rate
                            >= self.config.failure_threshold_percentage as f64
                    {
                        self.transition(
                            &mut inner,
                            CircuitState::Closed,
                            CircuitState::Open,
                            "failure_rate_exceeded",
                        );
                    }
                }
            }

            CircuitState::HalfOpen => {
                if success {
                    if inner.success_count >= self.config.half_open_success_threshold as u64 {
                        self.transition(
                            &mut inner,
                            CircuitState::HalfOpen,
                            CircuitState::Closed,
                            "success_threshold_reached",
                        );
                    }
                } else {
                    // Any failure while half-open immediately re-opens.
                    self.transition(
                        &mut inner,
                        CircuitState::HalfOpen,
                        CircuitState::Open,
                        "half_open_failure",
                    );
                }
            }

            CircuitState::Open => {
                // Admission rejected these; a result here means the caller
                // recorded without admitting.
                warn!(event = "breaker_anomaly", breaker = %self.key, "result recorded while open");
            }
        }
    }

    /// Operational override: jump to OPEN regardless of the current state.
    pub fn force_open(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        let from = self.state();
        self.apply_entry(&mut inner, CircuitState::Open);
        self.log_transition(from, CircuitState::Open, "forced");
    }

    /// Operational override: jump to CLOSED regardless of the current state.
    pub fn force_close(&self) {
        let mut inner = self.inner.lock().expect("breaker lock poisoned");
        let from = self.state();
        self.apply_entry(&mut inner, CircuitState::Closed);
        self.log_transition(from, CircuitState::Closed, "forced");
    }

    pub fn window_stats(&self) -> WindowStats {
        self.window.stats()
    }

    /// Read-only snapshot for operational surfaces.
    pub fn view(&self) -> BreakerView {
        let inner = self.inner.lock().expect("breaker lock poisoned");
        BreakerView {
            key: self.key.clone(),
            state: self.state(),
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            request_count: inner.request_count,
            half_open_admitted: inner.half_open_admitted,
            state_changed_at_rfc3339: chrono::DateTime::from_timestamp_millis(
                inner.state_change_time as i64,
            )
            .map(|t| t.to_rfc3339()),
            window: self.window.stats(),
        }
    }

    /// Guarded transition; anything outside the graph is rejected.
    fn transition(
        &self,
        inner: &mut BreakerInner,
        from: CircuitState,
        to: CircuitState,
        reason: &'static str,
    ) {
        let valid = matches!(
            (from, to),
            (CircuitState::Closed, CircuitState::Open)
                | (CircuitState::Open, CircuitState::HalfOpen)
                | (CircuitState::HalfOpen, CircuitState::Closed)
                | (CircuitState::HalfOpen, CircuitState::Open)
        );

        if !valid || self.state() != from {
            warn!(
                event = "breaker_invalid_transition",
                breaker = %self.key,
                from = from.as_str(),
                to = to.as_str()
            );
            return;
        }

        self.apply_entry(inner, to);
        self.log_transition(from, to, reason);
    }

    /// State-entry effects shared by guarded and forced transitions.
    fn apply_entry(&self, inner: &mut BreakerInner, to: CircuitState) {
        match to {
            CircuitState::Closed => {
                *inner = BreakerInner::default();
                self.window.reset();
            }
            CircuitState::Open => {
                inner.half_open_admitted = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count = 0;
                inner.half_open_admitted = 0;
            }
        }
        inner.state_change_time = self.clock.now_millis();
        self.state.store(to.as_u8(), Ordering::Release);
    }

    fn log_transition(&self, from: CircuitState, to: CircuitState, reason: &'static str) {
        info!(
            event = "circuit_transition",
            breaker = %self.key,
            from = from.as_str(),
            to = to.as_str(),
            reason = reason
        );
        self.sink.breaker_transition(&self.key, from.as_str(), to.as_str());
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Operational snapshot of one breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerView {
    pub key: String,
    pub state: CircuitState,
    pub failure_count: u64,
    pub success_count: u64,
    pub request_count: u64,
    pub half_open_admitted: u32,
    pub state_changed_at_rfc3339: Option<String>,
    #[serde(skip)]
    pub window: WindowStats,
}
