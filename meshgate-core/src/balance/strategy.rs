use crate::balance::LoadBalancer;
use crate::registry::ServiceInstance;
use std::sync::Arc;

/// An instance-selection algorithm.
///
/// `eligible` is pre-filtered (enabled, gray-matched) and sorted by
/// `ip:port`, so index arithmetic is meaningful across calls.
pub trait BalanceStrategy: Send + Sync {
    fn choose(
        &self,
        service_id: &str,
        eligible: &[Arc<ServiceInstance>],
        balancer: &LoadBalancer,
    ) -> Option<Arc<ServiceInstance>>;
}
