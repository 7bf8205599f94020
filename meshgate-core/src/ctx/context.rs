use crate::ctx::{GatewayRequest, GatewayResponse};
use crate::error::GatewayError;
use crate::registry::{Protocol, Rule};
use http::Extensions;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Lifecycle of a request context.
///
/// `Terminated` is reachable only from `Written` or from a terminating
/// filter (which records a throwable instead of a response).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    Written,
    Terminated,
}

/// Per-request state owned by the worker driving the filter chain.
///
/// Only that worker mutates the context; telemetry may read concurrently but
/// must not treat reads as a synchronization point.
#[derive(Debug)]
pub struct GatewayContext {
    pub protocol: Protocol,
    pub keep_alive: bool,
    pub request: GatewayRequest,
    pub rule: Arc<Rule>,
    pub response: Option<GatewayResponse>,
    pub throwable: Option<GatewayError>,
    /// Request-scoped typed state shared between filters (breaker admission,
    /// monitor timestamps). Not forwarded, not logged.
    pub extensions: Extensions,
    /// Gray marker for canary routing; set by the gray filter.
    pub gray: bool,
    pub request_id: Uuid,
    pub started_at: Instant,
    state: ContextState,
}

impl GatewayContext {
    pub fn new(
        protocol: Protocol,
        keep_alive: bool,
        request: GatewayRequest,
        rule: Arc<Rule>,
    ) -> Self {
        Self {
            protocol,
            keep_alive,
            request,
            rule,
            response: None,
            throwable: None,
            extensions: Extensions::new(),
            gray: false,
            request_id: Uuid::new_v4(),
            started_at: Instant::now(),
            state: ContextState::Running,
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ContextState::Terminated
    }

    /// Record the response and move to `Written`. First write wins; a
    /// context never carries both a response and a throwable.
    pub fn write_response(&mut self, response: GatewayResponse) {
        if self.response.is_none() && self.throwable.is_none() {
            self.response = Some(response);
            if self.state == ContextState::Running {
                self.state = ContextState::Written;
            }
        }
    }

    /// Record a failure and terminate. The result filter observes the
    /// throwable only when no response was written first.
    pub fn fail(&mut self, err: GatewayError) {
        if self.response.is_none() && self.throwable.is_none() {
            self.throwable = Some(err);
        }
        self.terminated();
    }

    /// Idempotent; short-circuits the remainder of the chain.
    pub fn terminated(&mut self) {
        self.state = ContextState::Terminated;
    }
}
