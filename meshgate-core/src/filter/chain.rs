use crate::ctx::GatewayContext;
use crate::filter::{Filter, order};
use std::sync::Arc;
use tracing::{debug, error};

/// Ordered filter pipeline for one rule.
pub struct GatewayFilterChain {
    filters: Vec<Arc<dyn Filter>>,
    /// Index of the first terminal-stage filter.
    terminal_from: usize,
}

impl GatewayFilterChain {
    /// `sort_by_key` is stable, so filters with equal orders keep the
    /// position the factory appended them in (seeds first, then the rule's
    /// config order).
    pub fn new(mut filters: Vec<Arc<dyn Filter>>) -> Self {
        filters.sort_by_key(|f| f.order());
        let terminal_from = filters
            .iter()
            .position(|f| f.order() >= order::TERMINAL_STAGE)
            .unwrap_or(filters.len());
        Self {
            filters,
            terminal_from,
        }
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    /// Run the chain to completion.
    ///
    /// Regular filters run sequentially until one terminates the context or
    /// fails; a failure becomes the context throwable. Terminal stages (the
    /// breaker result filter and the end-of-request monitor) then run
    /// unconditionally so outcomes are always recorded.
    pub async fn execute(&self, ctx: &mut GatewayContext) {
        for filter in &self.filters[..self.terminal_from] {
            if ctx.is_terminated() {
                break;
            }

            debug!(
                event = "filter_run",
                request_id = %ctx.request_id,
                filter = filter.id()
            );

            if let Err(err) = filter.filter(ctx).await {
                debug!(
                    event = "filter_failed",
                    request_id = %ctx.request_id,
                    filter = filter.id(),
                    error = %err
                );
                ctx.fail(err);
                break;
            }
        }

        for filter in &self.filters[self.terminal_from..] {
            if let Err(err) = filter.filter(ctx).await {
                // Terminal stages are bookkeeping; their failures must never
                // replace the request outcome.
                error!(
                    event = "terminal_filter_failed",
                    request_id = %ctx.request_id,
                    filter = filter.id(),
                    error = %err
                );
            }
        }
    }
}
