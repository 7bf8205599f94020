use crate::balance::{LoadBalancer, strategy::BalanceStrategy};
use crate::registry::ServiceInstance;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct RoundRobin;

impl BalanceStrategy for RoundRobin {
    fn choose(
        &self,
        service_id: &str,
        eligible: &[Arc<ServiceInstance>],
        balancer: &LoadBalancer,
    ) -> Option<Arc<ServiceInstance>> {
        if eligible.is_empty() {
            return None;
        }

        // The cursor advances exactly once per selection, so a stable set of
        // n instances is covered once per n consecutive picks.
        let tick = balancer.next_tick(service_id);
        Some(eligible[(tick % eligible.len() as u64) as usize].clone())
    }
}
