use crate::filter::{
    CIRCUIT_BREAKER_FILTER, CIRCUIT_BREAKER_RESULT_FILTER, Filter, FilterRegistry, GRAY_FILTER,
    GatewayFilterChain, MOCK_FILTER, MONITOR_END_FILTER, MONITOR_FILTER, ROUTER_FILTER,
};
use crate::registry::Rule;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Built chains are reused for this long before being rebuilt from the
/// current rule. Rule replacement (delete + insert under a new id) takes
/// effect immediately; the TTL only bounds staleness for in-place mutation
/// misuse.
const CHAIN_TTL: Duration = Duration::from_secs(600);

struct CachedChain {
    chain: Arc<GatewayFilterChain>,
    built_at: Instant,
}

/// Builds and caches the per-rule filter pipeline.
pub struct FilterChainFactory {
    filters: Arc<FilterRegistry>,
    cache: DashMap<String, CachedChain>,
}

impl FilterChainFactory {
    pub fn new(filters: Arc<FilterRegistry>) -> Self {
        Self {
            filters,
            cache: DashMap::new(),
        }
    }

    /// Chain for the rule, from cache when fresh.
    pub fn chain_for(&self, rule: &Rule) -> Arc<GatewayFilterChain> {
        if let Some(cached) = self.cache.get(&rule.id)
            && cached.built_at.elapsed() < CHAIN_TTL
        {
            return cached.chain.clone();
        }

        let chain = Arc::new(self.build(rule));
        self.cache.insert(
            rule.id.clone(),
            CachedChain {
                chain: chain.clone(),
                built_at: Instant::now(),
            },
        );
        chain
    }

    /// Drop a cached chain eagerly (rule removal).
    pub fn invalidate(&self, rule_id: &str) {
        self.cache.remove(rule_id);
    }

    /// Chain construction:
    /// 1. seed with the pre-rule filters in their declared orders,
    /// 2. append each configured filter known to the registry,
    /// 3. append the breaker result stage when the breaker is configured,
    /// 4. append the router; the chain constructor stable-sorts by order.
    fn build(&self, rule: &Rule) -> GatewayFilterChain {
        let mut picked: Vec<Arc<dyn Filter>> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for id in [MONITOR_FILTER, GRAY_FILTER, MONITOR_END_FILTER, MOCK_FILTER] {
            if let Some(filter) = self.filters.get(id) {
                picked.push(filter);
                seen.insert(id);
            }
        }

        for fc in &rule.filter_configs {
            if seen.contains(fc.id.as_str()) {
                continue;
            }
            match self.filters.get(&fc.id) {
                Some(filter) => {
                    seen.insert(filter.id());
                    picked.push(filter);
                }
                None => {
                    warn!(event = "unknown_filter_config", rule = %rule.id, filter = %fc.id);
                }
            }
        }

        if seen.contains(CIRCUIT_BREAKER_FILTER)
            && !seen.contains(CIRCUIT_BREAKER_RESULT_FILTER)
            && let Some(result) = self.filters.get(CIRCUIT_BREAKER_RESULT_FILTER)
        {
            seen.insert(CIRCUIT_BREAKER_RESULT_FILTER);
            picked.push(result);
        }

        if !seen.contains(ROUTER_FILTER)
            && let Some(router) = self.filters.get(ROUTER_FILTER)
        {
            picked.push(router);
        }

        GatewayFilterChain::new(picked)
    }
}
