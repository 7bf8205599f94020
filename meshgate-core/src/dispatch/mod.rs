#[cfg(test)]
mod tests;

use crate::ctx::{GatewayContext, GatewayRequest, GatewayResponse};
use crate::error::GatewayError;
use crate::filter::FilterChainFactory;
use crate::registry::{Protocol, Registry, Rule};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderMap, Method, Uri};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Raw inbound request as handed over by the HTTP front-end.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub peer_ip: IpAddr,
    pub keep_alive: bool,
}

/// Entry point of the request-processing core.
///
/// Resolves the inbound request to a service and rule, builds the context,
/// drives the rule's filter chain and renders the response. Transport
/// concerns (writing bytes, honoring keep-alive) stay with the front-end.
pub struct Dispatcher {
    registry: Arc<Registry>,
    factory: Arc<FilterChainFactory>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, factory: Arc<FilterChainFactory>) -> Self {
        Self { registry, factory }
    }

    pub async fn dispatch(&self, inbound: Inbound) -> GatewayResponse {
        match self.run(inbound).await {
            Ok(response) => response,
            Err(err) => {
                debug!(event = "request_rejected", code = err.code(), error = %err);
                GatewayResponse::from_error(&err)
            }
        }
    }

    async fn run(&self, inbound: Inbound) -> Result<GatewayResponse, GatewayError> {
        let unique_id = header(&inbound.headers, "uniqueId")
            .map(str::to_string)
            .ok_or_else(|| GatewayError::ServiceDefinitionNotFound {
                unique_id: "<missing uniqueId header>".to_string(),
            })?;

        let client_ip = client_ip(&inbound.headers, inbound.peer_ip);
        let path = inbound.uri.path().to_string();

        let definition = self.registry.get_definition(&unique_id).ok_or_else(|| {
            GatewayError::ServiceDefinitionNotFound {
                unique_id: unique_id.clone(),
            }
        })?;

        let rule = self.resolve_rule(&definition.service_id, &path)?;

        let content_type = header(&inbound.headers, CONTENT_TYPE.as_str()).map(str::to_string);
        let charset = content_type.as_deref().and_then(parse_charset);
        let host = header(&inbound.headers, HOST.as_str()).map(str::to_string);

        let request = GatewayRequest {
            unique_id,
            method: inbound.method,
            uri: inbound.uri,
            path,
            client_ip,
            host,
            headers: inbound.headers,
            body: inbound.body,
            content_type,
            charset,
            modify_host: None,
        };

        let mut ctx = GatewayContext::new(Protocol::Http, inbound.keep_alive, request, rule);
        let chain = self.factory.chain_for(&ctx.rule);
        chain.execute(&mut ctx).await;

        if let Some(response) = ctx.response.take() {
            return Ok(response);
        }
        if let Some(err) = ctx.throwable.take() {
            return Err(err);
        }
        // The chain ran dry without an outcome; nothing was written.
        Err(GatewayError::ServiceUnavailable {
            reason: "request produced no response".to_string(),
        })
    }

    /// Exact-path lookup first; otherwise the first rule (in rule order)
    /// whose prefix is a prefix of the path.
    fn resolve_rule(&self, service_id: &str, path: &str) -> Result<Arc<Rule>, GatewayError> {
        if let Some(rule) = self.registry.get_rule_by_path(service_id, path) {
            return Ok(rule);
        }

        self.registry
            .get_rules_by_service(service_id)
            .into_iter()
            .find(|rule| !rule.prefix.is_empty() && path.starts_with(rule.prefix.as_str()))
            .ok_or_else(|| GatewayError::PathNoMatched {
                service_id: service_id.to_string(),
                path: path.to_string(),
            })
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// First `X-Forwarded-For` token when present, else the transport peer.
fn client_ip(headers: &HeaderMap, peer: IpAddr) -> IpAddr {
    header(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .and_then(|token| token.trim().parse().ok())
        .unwrap_or(peer)
}

fn parse_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset="))
        .map(|cs| cs.trim_matches('"').to_string())
}
