use super::*;
use crate::balance::LoadBalancer;
use crate::client::BackendClient;
use crate::clock::ManualClock;
use crate::ctx::GatewayRequest;
use crate::error::BackendError;
use crate::filter::builtin::{FilterDeps, register_builtin_filters};
use crate::filter::{FilterChainFactory, FilterRegistry};
use crate::metrics::noop_metrics;
use crate::ratelimit::RateLimiterCache;
use crate::registry::{FilterConfig, ServiceDefinition, ServiceInstance};
use crate::traffic::CircuitBreakerRegistry;
use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use pretty_assertions::assert_eq;
use std::net::Ipv4Addr;

struct EchoBackend;

#[async_trait]
impl BackendClient for EchoBackend {
    async fn send(
        &self,
        request: &GatewayRequest,
        modify_host: &str,
        _timeout_ms: u64,
    ) -> Result<GatewayResponse, BackendError> {
        Ok(GatewayResponse::new(StatusCode::OK)
            .with_body(format!("{} {}", modify_host, request.path)))
    }
}

fn gateway() -> (Arc<Registry>, Dispatcher) {
    let registry = Arc::new(Registry::new());
    let clock = Arc::new(ManualClock::new(1_000_000));
    let metrics = noop_metrics();

    let deps = FilterDeps {
        registry: registry.clone(),
        balancer: Arc::new(LoadBalancer::new()),
        breakers: Arc::new(CircuitBreakerRegistry::new(clock.clone(), metrics.clone())),
        limiters: Arc::new(RateLimiterCache::new()),
        client: Arc::new(EchoBackend),
        metrics,
        clock,
        invoker_timeout_ms: 500,
        default_gray: false,
    };

    let mut filters = FilterRegistry::new();
    register_builtin_filters(&mut filters, &deps);
    let factory = Arc::new(FilterChainFactory::new(Arc::new(filters)));

    (registry.clone(), Dispatcher::new(registry, factory))
}

fn seed_service(registry: &Registry) {
    registry.put_service(ServiceDefinition {
        service_id: "users".to_string(),
        version: "1.0".to_string(),
        protocol: Protocol::Http,
        env_type: "prod".to_string(),
        pattern_path: "/users/**".to_string(),
    });
    registry.put_instance(ServiceInstance {
        unique_id: "users:1.0".to_string(),
        ip: "10.0.0.1".to_string(),
        port: 8080,
        register_time: 1_700_000_000_000,
        version: "1.0".to_string(),
        weight: 100,
        gray: false,
        enable: true,
    });
}

fn routed_rule(id: &str, order: i32, prefix: &str, paths: &[&str]) -> Rule {
    Rule {
        id: id.to_string(),
        name: format!("rule-{id}"),
        protocol: Protocol::Http,
        service_id: "users".to_string(),
        prefix: prefix.to_string(),
        paths: paths.iter().map(|p| p.to_string()).collect(),
        order,
        filter_configs: vec![FilterConfig {
            id: "load_balance_filter".to_string(),
            config: "{}".to_string(),
        }],
    }
}

fn inbound(path: &'static str) -> Inbound {
    let mut headers = HeaderMap::new();
    headers.insert("uniqueId", HeaderValue::from_static("users:1.0"));
    Inbound {
        method: Method::GET,
        uri: Uri::from_static(path),
        headers,
        body: Bytes::new(),
        peer_ip: Ipv4Addr::new(127, 0, 0, 1).into(),
        keep_alive: true,
    }
}

fn body_code(response: &GatewayResponse) -> String {
    let body: serde_json::Value = serde_json::from_slice(&response.body).expect("json body");
    body["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn missing_unique_id_header_is_a_definition_miss() {
    // Arrange
    let (_registry, dispatcher) = gateway();
    let mut request = inbound("/users/profile");
    request.headers.remove("uniqueId");

    // Act
    let response = dispatcher.dispatch(request).await;

    // Assert
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(body_code(&response), "SERVICE_DEFINITION_NOT_FOUND");
}

#[tokio::test]
async fn unknown_service_is_a_definition_miss() {
    // Arrange: no definitions registered.
    let (_registry, dispatcher) = gateway();

    // Act
    let response = dispatcher.dispatch(inbound("/users/profile")).await;

    // Assert
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(body_code(&response), "SERVICE_DEFINITION_NOT_FOUND");
}

#[tokio::test]
async fn unmatched_path_is_reported() {
    // Arrange
    let (registry, dispatcher) = gateway();
    seed_service(&registry);
    registry.put_rule(routed_rule("r1", 0, "/users", &[]));

    // Act
    let response = dispatcher.dispatch(inbound("/orders/list")).await;

    // Assert
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(body_code(&response), "PATH_NO_MATCHED");
}

#[tokio::test]
async fn exact_path_rule_wins_over_prefix_rule() {
    // Arrange: rule A lists /users/login exactly; rule B owns the /users
    // prefix. A mocks, B proxies, so the chosen rule is observable.
    let (registry, dispatcher) = gateway();
    seed_service(&registry);

    let mut exact = routed_rule("ra", 5, "", &["/users/login"]);
    exact.filter_configs.push(FilterConfig {
        id: "mock_filter".to_string(),
        config: "{\"status\": 200, \"body\": \"exact\"}".to_string(),
    });
    registry.put_rule(exact);
    registry.put_rule(routed_rule("rb", 0, "/users", &[]));

    // Act
    let exact_hit = dispatcher.dispatch(inbound("/users/login")).await;
    let prefix_hit = dispatcher.dispatch(inbound("/users/login/audit")).await;

    // Assert
    assert_eq!(exact_hit.body.as_ref(), b"exact");
    assert_eq!(prefix_hit.body.as_ref(), b"10.0.0.1:8080 /users/login/audit");
}

#[tokio::test]
async fn proxied_request_reaches_the_balanced_instance() {
    // Arrange
    let (registry, dispatcher) = gateway();
    seed_service(&registry);
    registry.put_rule(routed_rule("r1", 0, "/users", &[]));

    // Act
    let response = dispatcher.dispatch(inbound("/users/profile")).await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.as_ref(), b"10.0.0.1:8080 /users/profile");
}

#[tokio::test]
async fn forwarded_for_header_feeds_ip_security() {
    // Arrange: blacklist the forwarded client, not the transport peer.
    let (registry, dispatcher) = gateway();
    seed_service(&registry);

    let mut rule = routed_rule("r1", 0, "/users", &[]);
    rule.filter_configs.push(FilterConfig {
        id: "ip_security_filter".to_string(),
        config: "{\"blacklist\": [\"203.0.113.9\"]}".to_string(),
    });
    registry.put_rule(rule);

    let mut request = inbound("/users/profile");
    request
        .headers
        .insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));

    // Act
    let response = dispatcher.dispatch(request).await;

    // Assert
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(body_code(&response), "BLACKLIST");
}

#[tokio::test]
async fn rate_limited_burst_gets_unavailable() {
    // Arrange: 2/s per ip with no wait budget.
    let (registry, dispatcher) = gateway();
    seed_service(&registry);

    let mut rule = routed_rule("r1", 0, "/users", &[]);
    rule.filter_configs.push(FilterConfig {
        id: "rate_limit_filter".to_string(),
        config: "{\"limitType\": \"ip\", \"requestsPerSecond\": 2, \"timeoutMs\": 0}".to_string(),
    });
    registry.put_rule(rule);

    // Act
    let first = dispatcher.dispatch(inbound("/users/profile")).await;
    let second = dispatcher.dispatch(inbound("/users/profile")).await;
    let third = dispatcher.dispatch(inbound("/users/profile")).await;

    // Assert
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(third.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_code(&third), "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn gray_requests_need_a_gray_instance() {
    // Arrange: only a non-gray instance exists.
    let (registry, dispatcher) = gateway();
    seed_service(&registry);
    registry.put_rule(routed_rule("r1", 0, "/users", &[]));

    let mut request = inbound("/users/profile");
    request.headers.insert("gray", HeaderValue::from_static("true"));

    // Act
    let rejected = dispatcher.dispatch(request.clone()).await;

    // A gray instance appears; the same request now routes to it.
    registry.put_instance(ServiceInstance {
        unique_id: "users:1.0".to_string(),
        ip: "10.0.0.9".to_string(),
        port: 8080,
        register_time: 1_700_000_000_000,
        version: "1.0".to_string(),
        weight: 100,
        gray: true,
        enable: true,
    });
    let served = dispatcher.dispatch(request).await;

    // Assert
    assert_eq!(rejected.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_code(&rejected), "SERVICE_INSTANCE_NOT_FOUND");
    assert_eq!(served.body.as_ref(), b"10.0.0.9:8080 /users/profile");
}
