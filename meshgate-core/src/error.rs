use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Failure of a single backend call, as seen by the router filter.
///
/// Transport-level failures are kept as discrete variants so the circuit
/// breaker can classify them without string matching.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("failed to connect to {host}: {detail}")]
    Connect { host: String, detail: String },

    #[error("backend call to {host} timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },

    #[error("failed to read response from {host}: {detail}")]
    Read { host: String, detail: String },
}

/// Gateway error taxonomy. Each variant maps to a stable wire code and an
/// HTTP status; the client-visible body is always [`ErrorBody`] unless a
/// configured fallback replaces it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("no service definition registered for '{unique_id}'")]
    ServiceDefinitionNotFound { unique_id: String },

    #[error("no rule of service '{service_id}' matched path '{path}'")]
    PathNoMatched { service_id: String, path: String },

    #[error("no eligible instance for service '{service_id}'")]
    ServiceInstanceNotFound { service_id: String },

    #[error("service unavailable: {reason}")]
    ServiceUnavailable { reason: String },

    #[error("client ip {ip} is blacklisted")]
    Blacklist { ip: IpAddr },

    #[error("client ip {ip} is not on the whitelist")]
    Whitelist { ip: IpAddr },

    /// Circuit open with a configured fallback body. Rendered as 200 with
    /// the fallback payload instead of the JSON error shape.
    #[error("circuit open, serving configured fallback")]
    GatewayFallback { body: String },

    #[error("backend call failed: {0}")]
    HttpResponseError(#[from] BackendError),
}

impl GatewayError {
    /// Stable wire code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::ServiceDefinitionNotFound { .. } => "SERVICE_DEFINITION_NOT_FOUND",
            GatewayError::PathNoMatched { .. } => "PATH_NO_MATCHED",
            GatewayError::ServiceInstanceNotFound { .. } => "SERVICE_INSTANCE_NOT_FOUND",
            GatewayError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            GatewayError::Blacklist { .. } => "BLACKLIST",
            GatewayError::Whitelist { .. } => "WHITELIST",
            GatewayError::GatewayFallback { .. } => "GATEWAY_FALLBACK",
            GatewayError::HttpResponseError(_) => "HTTP_RESPONSE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ServiceDefinitionNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::PathNoMatched { .. } => StatusCode::NOT_FOUND,
            GatewayError::ServiceInstanceNotFound { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Blacklist { .. } => StatusCode::FORBIDDEN,
            GatewayError::Whitelist { .. } => StatusCode::FORBIDDEN,
            GatewayError::GatewayFallback { .. } => StatusCode::OK,
            GatewayError::HttpResponseError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// JSON error shape written to clients. Backend-internal detail never leaks
/// here; the raw error goes to the logs only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn of(err: &GatewayError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}
