pub mod builtin;
mod chain;
mod factory;
mod registry;


pub use chain::*;
pub use factory::*;
pub use registry::*;

use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use async_trait::async_trait;

/// Well-known filter ids. Rules reference these in their filter configs.
pub const MONITOR_FILTER: &str = "monitor_filter";
pub const GRAY_FILTER: &str = "gray_filter";
pub const MOCK_FILTER: &str = "mock_filter";
pub const IP_SECURITY_FILTER: &str = "ip_security_filter";
pub const RATE_LIMIT_FILTER: &str = "rate_limit_filter";
pub const LOAD_BALANCE_FILTER: &str = "load_balance_filter";
pub const CIRCUIT_BREAKER_FILTER: &str = "circuit_breaker_filter";
pub const ROUTER_FILTER: &str = "router_filter";
pub const CIRCUIT_BREAKER_RESULT_FILTER: &str = "circuit_breaker_result_filter";
pub const MONITOR_END_FILTER: &str = "monitor_end_filter";

/// Chain positions. Lower runs earlier; ties keep registration order.
pub mod order {
    pub const MONITOR: i32 = i32::MIN;
    pub const GRAY: i32 = -100;
    pub const MOCK: i32 = -50;
    pub const IP_SECURITY: i32 = -10;
    pub const RATE_LIMIT: i32 = 1;
    pub const LOAD_BALANCE: i32 = 50;
    pub const CIRCUIT_BREAKER: i32 = 95;
    pub const ROUTER: i32 = 100;
    pub const CIRCUIT_BREAKER_RESULT: i32 = i32::MAX - 1;
    pub const MONITOR_END: i32 = i32::MAX;

    /// Filters at or above this order run unconditionally, finally-style,
    /// even after a short-circuit — the result filter must always observe a
    /// stashed breaker admission.
    pub const TERMINAL_STAGE: i32 = i32::MAX - 1;
}

/// A pluggable stage in a rule's processing pipeline.
///
/// Instances are process-lifetime singletons: stateless, or internally
/// thread-safe. A filter may mutate the context, short-circuit the chain via
/// `ctx.terminated()`, or fail with a typed error that the chain driver
/// records as the context throwable.
#[async_trait]
pub trait Filter: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str {
        self.id()
    }

    fn order(&self) -> i32;

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError>;
}
