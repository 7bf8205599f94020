mod circuit_breaker;
mod circuit_breaker_result;
mod gray;
mod ip_security;
mod load_balance;
mod mock;
mod monitor;
mod rate_limit;
mod router;

pub use circuit_breaker::*;
pub use circuit_breaker_result::*;
pub use gray::*;
pub use ip_security::*;
pub use load_balance::*;
pub use mock::*;
pub use monitor::*;
pub use rate_limit::*;
pub use router::*;

use crate::balance::LoadBalancer;
use crate::client::BackendClient;
use crate::clock::Clock;
use crate::filter::FilterRegistry;
use crate::metrics::MetricsSink;
use crate::ratelimit::RateLimiterCache;
use crate::registry::Registry;
use crate::traffic::CircuitBreakerRegistry;
use std::sync::Arc;

/// Everything the builtin filters need from the host.
#[derive(Clone)]
pub struct FilterDeps {
    pub registry: Arc<Registry>,
    pub balancer: Arc<LoadBalancer>,
    pub breakers: Arc<CircuitBreakerRegistry>,
    pub limiters: Arc<RateLimiterCache>,
    pub client: Arc<dyn BackendClient>,
    pub metrics: Arc<dyn MetricsSink>,
    pub clock: Arc<dyn Clock>,
    /// Default backend invocation timeout (`invoker.timeout`).
    pub invoker_timeout_ms: u64,
    /// Gateway-level gray flag applied to unmarked requests.
    pub default_gray: bool,
}

/// Register every builtin filter. Hosts extend the registry afterwards if
/// they carry custom filters.
pub fn register_builtin_filters(registry: &mut FilterRegistry, deps: &FilterDeps) {
    registry.register(Arc::new(MonitorFilter::new(deps.metrics.clone())));
    registry.register(Arc::new(GrayFilter::new(deps.default_gray)));
    registry.register(Arc::new(MockFilter::default()));
    registry.register(Arc::new(IpSecurityFilter::default()));
    registry.register(Arc::new(RateLimitFilter::new(
        deps.limiters.clone(),
        deps.metrics.clone(),
    )));
    registry.register(Arc::new(LoadBalanceFilter::new(
        deps.registry.clone(),
        deps.balancer.clone(),
    )));
    registry.register(Arc::new(CircuitBreakerFilter::new(
        deps.breakers.clone(),
        deps.clock.clone(),
    )));
    registry.register(Arc::new(RouterFilter::new(
        deps.client.clone(),
        deps.invoker_timeout_ms,
    )));
    registry.register(Arc::new(CircuitBreakerResultFilter::new(deps.clock.clone())));
    registry.register(Arc::new(MonitorEndFilter::new(deps.metrics.clone())));
}
