use crate::clock::Clock;
use crate::ctx::{GatewayContext, GatewayResponse};
use crate::error::GatewayError;
use crate::filter::{CIRCUIT_BREAKER_FILTER, Filter, order};
use crate::traffic::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Stashed by the admission filter, consumed by the result filter.
#[derive(Clone)]
pub struct BreakerAdmission {
    pub breaker: Arc<CircuitBreaker>,
    pub start_ms: u64,
}

/// Admission gate in front of the router.
///
/// Rejection writes the configured fallback (200) or the unavailable error
/// shape (503) and terminates; admission stashes the breaker handle so the
/// result stage can attribute the outcome.
pub struct CircuitBreakerFilter {
    breakers: Arc<CircuitBreakerRegistry>,
    clock: Arc<dyn Clock>,
}

impl CircuitBreakerFilter {
    pub fn new(breakers: Arc<CircuitBreakerRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { breakers, clock }
    }
}

#[async_trait]
impl Filter for CircuitBreakerFilter {
    fn id(&self) -> &'static str {
        CIRCUIT_BREAKER_FILTER
    }

    fn order(&self) -> i32 {
        order::CIRCUIT_BREAKER
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let Some(fc) = ctx.rule.filter_config(CIRCUIT_BREAKER_FILTER) else {
            return Ok(());
        };

        let config = match serde_json::from_str::<CircuitBreakerConfig>(&fc.config) {
            Ok(cfg) => match cfg.validate() {
                Ok(()) => cfg,
                Err(reason) => {
                    warn!(event = "invalid_breaker_config", rule = %ctx.rule.id, reason = %reason);
                    CircuitBreakerConfig::default()
                }
            },
            Err(_) => CircuitBreakerConfig::default(),
        };

        let breaker = self.breakers.get_or_create(&ctx.rule.service_id, &config);

        if breaker.allow_request() {
            ctx.extensions.insert(BreakerAdmission {
                breaker,
                start_ms: self.clock.now_millis(),
            });
            return Ok(());
        }

        let err = match &breaker.config().fallback_response {
            Some(body) => GatewayError::GatewayFallback { body: body.clone() },
            None => GatewayError::ServiceUnavailable {
                reason: format!("circuit open for service '{}'", ctx.rule.service_id),
            },
        };
        ctx.write_response(GatewayResponse::from_error(&err));
        ctx.terminated();
        Ok(())
    }
}
