use crate::balance::{LoadBalancer, StrategyKind};
use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, LOAD_BALANCE_FILTER, order};
use crate::registry::Registry;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoadBalanceConfig {
    load_balance_key: String,
}

/// Chooses a backend instance and rewrites the request host to it.
pub struct LoadBalanceFilter {
    registry: Arc<Registry>,
    balancer: Arc<LoadBalancer>,
}

impl LoadBalanceFilter {
    pub fn new(registry: Arc<Registry>, balancer: Arc<LoadBalancer>) -> Self {
        Self { registry, balancer }
    }
}

#[async_trait]
impl Filter for LoadBalanceFilter {
    fn id(&self) -> &'static str {
        LOAD_BALANCE_FILTER
    }

    fn order(&self) -> i32 {
        order::LOAD_BALANCE
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let kind = ctx
            .rule
            .filter_config(LOAD_BALANCE_FILTER)
            .and_then(|fc| serde_json::from_str::<LoadBalanceConfig>(&fc.config).ok())
            .map(|cfg| StrategyKind::parse(&cfg.load_balance_key))
            .unwrap_or_default();

        let instances = self.registry.get_instances(&ctx.request.unique_id);
        let instance =
            self.balancer
                .select(kind, &ctx.rule.service_id, &instances, ctx.gray)?;

        let modify_host = instance.service_instance_id();
        debug!(
            event = "instance_selected",
            request_id = %ctx.request_id,
            service = %ctx.rule.service_id,
            instance = %modify_host,
            gray = ctx.gray
        );
        ctx.request.modify_host = Some(modify_host);
        Ok(())
    }
}
