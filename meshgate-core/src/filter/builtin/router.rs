use crate::client::BackendClient;
use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, ROUTER_FILTER, order};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Dispatches the request to the chosen backend instance.
///
/// The only suspending filter in the chain. Backend responses are relayed
/// verbatim (including 5xx — the result stage classifies them); transport
/// failures surface as the context throwable.
pub struct RouterFilter {
    client: Arc<dyn BackendClient>,
    invoker_timeout_ms: u64,
}

impl RouterFilter {
    pub fn new(client: Arc<dyn BackendClient>, invoker_timeout_ms: u64) -> Self {
        Self {
            client,
            invoker_timeout_ms,
        }
    }
}

#[async_trait]
impl Filter for RouterFilter {
    fn id(&self) -> &'static str {
        ROUTER_FILTER
    }

    fn order(&self) -> i32 {
        order::ROUTER
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let Some(modify_host) = ctx.request.modify_host.clone() else {
            // No load-balance stage ran for this rule.
            return Err(GatewayError::ServiceInstanceNotFound {
                service_id: ctx.rule.service_id.clone(),
            });
        };

        debug!(
            event = "backend_call",
            request_id = %ctx.request_id,
            host = %modify_host,
            path = %ctx.request.path,
            timeout_ms = self.invoker_timeout_ms
        );

        let response = self
            .client
            .send(&ctx.request, &modify_host, self.invoker_timeout_ms)
            .await?;

        ctx.write_response(response);
        Ok(())
    }
}
