pub mod algorithms;
mod strategy;

#[cfg(test)]
mod tests;

pub use strategy::*;

use crate::error::GatewayError;
use crate::registry::ServiceInstance;
use algorithms::{Random, RoundRobin};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static RANDOM: Lazy<Random> = Lazy::new(Random::default);
static ROUND_ROBIN: Lazy<RoundRobin> = Lazy::new(RoundRobin::default);

/// Which algorithm a rule asked for, from the `load_balance_key` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Random,
    RoundRobin,
}

impl StrategyKind {
    /// Unknown names fall back to random, the documented default.
    pub fn parse(name: &str) -> Self {
        match name {
            "round_robin" => StrategyKind::RoundRobin,
            _ => StrategyKind::Random,
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Random
    }
}

/// Instance selection over the registry's per-service instance sets.
///
/// Holds the per-service round-robin cursors; the strategies themselves are
/// stateless process singletons.
pub struct LoadBalancer {
    cursors: DashMap<String, AtomicU64>,
}

impl Default for LoadBalancer {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self {
            cursors: DashMap::new(),
        }
    }

    /// Strictly monotonic per-service counter; advances exactly once per
    /// call regardless of the eligible-set size.
    pub fn next_tick(&self, service_id: &str) -> u64 {
        self.cursors
            .entry(service_id.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed)
    }

    /// Pick a backend instance for the request.
    ///
    /// Eligibility: enabled instances whose gray marker equals the request's
    /// gray marker — gray traffic only reaches gray instances and vice
    /// versa. `instances` comes from the registry already sorted by
    /// `ip:port`.
    pub fn select(
        &self,
        kind: StrategyKind,
        service_id: &str,
        instances: &[Arc<ServiceInstance>],
        gray: bool,
    ) -> Result<Arc<ServiceInstance>, GatewayError> {
        let eligible: Vec<Arc<ServiceInstance>> = instances
            .iter()
            .filter(|i| i.enable && i.gray == gray)
            .cloned()
            .collect();

        let strategy: &dyn BalanceStrategy = match kind {
            StrategyKind::Random => &*RANDOM,
            StrategyKind::RoundRobin => &*ROUND_ROBIN,
        };

        strategy
            .choose(service_id, &eligible, self)
            .ok_or_else(|| GatewayError::ServiceInstanceNotFound {
                service_id: service_id.to_string(),
            })
    }
}
