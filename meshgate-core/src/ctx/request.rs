use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use std::net::IpAddr;

/// Parsed inbound request as the filter chain sees it.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// `serviceId:version` from the `uniqueId` header.
    pub unique_id: String,
    pub method: Method,
    pub uri: Uri,
    /// Path component used for rule matching.
    pub path: String,
    /// First `X-Forwarded-For` token when present, else the transport peer.
    pub client_ip: IpAddr,
    pub host: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    /// `ip:port` of the load-balancer-chosen backend instance. The router
    /// dispatches to this authority; the original host header is not used
    /// for backend addressing.
    pub modify_host: Option<String>,
}

impl GatewayRequest {
    /// Header lookup by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
