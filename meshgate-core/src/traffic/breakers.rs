use crate::clock::Clock;
use crate::metrics::MetricsSink;
use crate::traffic::circuit::{BreakerView, CircuitBreaker, CircuitBreakerConfig};
use dashmap::DashMap;
use std::sync::Arc;

/// Process-wide breaker singletons, one per protected backend service.
///
/// The first rule generation to reference a key fixes its config; rule
/// replacement does not tear the breaker down, so window history survives
/// redeploys.
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn MetricsSink>,
}

impl CircuitBreakerRegistry {
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            breakers: DashMap::new(),
            clock,
            sink,
        }
    }

    pub fn get_or_create(
        &self,
        key: &str,
        config: &CircuitBreakerConfig,
    ) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(key) {
            return existing.value().clone();
        }

        self.breakers
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    key,
                    config.clone(),
                    self.clock.clone(),
                    self.sink.clone(),
                ))
            })
            .value()
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(key).map(|e| e.value().clone())
    }

    /// Snapshot of every breaker, for operational surfaces.
    pub fn views(&self) -> Vec<BreakerView> {
        let mut views: Vec<BreakerView> =
            self.breakers.iter().map(|e| e.value().view()).collect();
        views.sort_by(|a, b| a.key.cmp(&b.key));
        views
    }
}
