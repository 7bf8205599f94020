use crate::error::{ErrorBody, GatewayError};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, StatusCode};

/// Response relayed (or originated) by the gateway.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type) {
            self.headers.insert(CONTENT_TYPE, value);
        }
        self
    }

    /// Gateway-originated error response: the taxonomy status with the JSON
    /// `{code, message}` body — except a configured fallback, whose payload
    /// replaces the error shape verbatim.
    pub fn from_error(err: &GatewayError) -> Self {
        if let GatewayError::GatewayFallback { body } = err {
            return Self::new(err.status())
                .with_body(body.clone())
                .with_content_type("application/json");
        }

        let body = serde_json::to_vec(&ErrorBody::of(err)).unwrap_or_default();
        Self::new(err.status())
            .with_body(body)
            .with_content_type("application/json")
    }
}
