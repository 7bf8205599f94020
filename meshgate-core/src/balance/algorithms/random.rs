use crate::balance::{LoadBalancer, strategy::BalanceStrategy};
use crate::registry::ServiceInstance;
use rand::{Rng, rng};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Random;

impl BalanceStrategy for Random {
    fn choose(
        &self,
        _service_id: &str,
        eligible: &[Arc<ServiceInstance>],
        _balancer: &LoadBalancer,
    ) -> Option<Arc<ServiceInstance>> {
        if eligible.is_empty() {
            return None;
        }

        // This is per thread, which is ok for a random algorithm.
        let idx = rng().random_range(0..eligible.len());
        Some(eligible[idx].clone())
    }
}
