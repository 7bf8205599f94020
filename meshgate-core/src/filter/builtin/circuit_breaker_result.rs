use crate::clock::Clock;
use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::builtin::BreakerAdmission;
use crate::filter::{CIRCUIT_BREAKER_RESULT_FILTER, Filter, order};
use async_trait::async_trait;
use std::sync::Arc;

/// Terminal stage: attributes the request outcome to the breaker that
/// admitted it.
///
/// Success is a backend response below 500 with no transport error; 4xx is
/// not a failure. Runs even after a short-circuit, so every admission is
/// balanced by at most one recording.
pub struct CircuitBreakerResultFilter {
    clock: Arc<dyn Clock>,
}

impl CircuitBreakerResultFilter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Filter for CircuitBreakerResultFilter {
    fn id(&self) -> &'static str {
        CIRCUIT_BREAKER_RESULT_FILTER
    }

    fn order(&self) -> i32 {
        order::CIRCUIT_BREAKER_RESULT
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        // Taking the stash out guards against double recording.
        let Some(admission) = ctx.extensions.remove::<BreakerAdmission>() else {
            return Ok(());
        };

        let success = match (&ctx.response, &ctx.throwable) {
            (Some(response), _) => response.status.as_u16() < 500,
            (None, Some(_)) => false,
            // Admitted but neither outcome materialized (a later filter
            // short-circuited without writing); nothing to attribute.
            (None, None) => return Ok(()),
        };

        let elapsed_ms = self.clock.now_millis().saturating_sub(admission.start_ms);
        admission.breaker.record_result(success, elapsed_ms);
        Ok(())
    }
}
