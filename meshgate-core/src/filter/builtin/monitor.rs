use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, MONITOR_END_FILTER, MONITOR_FILTER, order};
use crate::metrics::MetricsSink;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Opens the request-scoped telemetry span.
pub struct MonitorFilter {
    metrics: Arc<dyn MetricsSink>,
}

impl MonitorFilter {
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Filter for MonitorFilter {
    fn id(&self) -> &'static str {
        MONITOR_FILTER
    }

    fn order(&self) -> i32 {
        order::MONITOR
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        self.metrics
            .request_start(&ctx.rule.service_id, &ctx.request.path);
        debug!(
            event = "request_start",
            request_id = %ctx.request_id,
            service = %ctx.rule.service_id,
            method = %ctx.request.method,
            path = %ctx.request.path,
            client_ip = %ctx.request.client_ip
        );
        Ok(())
    }
}

/// Terminal stage: closes the telemetry span with the final outcome.
pub struct MonitorEndFilter {
    metrics: Arc<dyn MetricsSink>,
}

impl MonitorEndFilter {
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl Filter for MonitorEndFilter {
    fn id(&self) -> &'static str {
        MONITOR_END_FILTER
    }

    fn order(&self) -> i32 {
        order::MONITOR_END
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let status = match (&ctx.response, &ctx.throwable) {
            (Some(response), _) => response.status.as_u16(),
            (None, Some(err)) => err.status().as_u16(),
            (None, None) => 0,
        };

        let elapsed = ctx.started_at.elapsed();
        self.metrics
            .request_finish(&ctx.rule.service_id, &ctx.request.path, status, elapsed);
        info!(
            event = "request_finish",
            request_id = %ctx.request_id,
            service = %ctx.rule.service_id,
            path = %ctx.request.path,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64
        );
        Ok(())
    }
}
