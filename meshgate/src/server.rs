use crate::seed;
use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::response::Response;
use bytes::Bytes;
use http::header::CONNECTION;
use meshgate_core::balance::LoadBalancer;
use meshgate_core::client::HttpBackendClient;
use meshgate_core::clock::system_clock;
use meshgate_core::conf::GatewayConfig;
use meshgate_core::dispatch::{Dispatcher, Inbound};
use meshgate_core::filter::builtin::{FilterDeps, register_builtin_filters};
use meshgate_core::filter::{FilterChainFactory, FilterRegistry};
use meshgate_core::metrics::TracingMetrics;
use meshgate_core::ratelimit::RateLimiterCache;
use meshgate_core::registry::Registry;
use meshgate_core::traffic::CircuitBreakerRegistry;
use std::net::SocketAddr;
use std::sync::Arc;

/// Inbound bodies above this are truncated; the gateway does not buffer
/// arbitrarily large uploads.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
}

/// Wire the core together and serve until ctrl-c.
pub async fn run(cfg: GatewayConfig, seed_path: Option<String>) -> anyhow::Result<()> {
    let registry = Arc::new(Registry::new());
    if let Some(path) = seed_path {
        seed::apply(&registry, seed::load(&path)?);
    }

    let clock = system_clock();
    let metrics = Arc::new(TracingMetrics);

    let deps = FilterDeps {
        registry: registry.clone(),
        balancer: Arc::new(LoadBalancer::new()),
        breakers: Arc::new(CircuitBreakerRegistry::new(clock.clone(), metrics.clone())),
        limiters: Arc::new(RateLimiterCache::new()),
        client: Arc::new(HttpBackendClient::new()),
        metrics,
        clock,
        invoker_timeout_ms: cfg.invoker_timeout_ms,
        default_gray: cfg.gray,
    };

    let mut filters = FilterRegistry::new();
    register_builtin_filters(&mut filters, &deps);
    let factory = Arc::new(FilterChainFactory::new(Arc::new(filters)));

    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(registry, factory)),
    };

    let app = Router::new().fallback(proxy).with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(event = "gateway_listening", addr = %addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!(event = "gateway_stopped");
    Ok(())
}

/// Every path lands here; routing is the dispatcher's job, not axum's.
async fn proxy(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let keep_alive = parts
        .headers
        .get(CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| !v.eq_ignore_ascii_case("close"))
        .unwrap_or(true);

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .unwrap_or_else(|_| Bytes::new());

    let inbound = Inbound {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
        peer_ip: peer.ip(),
        keep_alive,
    };

    let outcome = state.dispatcher.dispatch(inbound).await;

    let mut response = Response::new(Body::from(outcome.body));
    *response.status_mut() = outcome.status;
    *response.headers_mut() = outcome.headers;
    response
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(event = "shutdown_signal_error", error = %err);
    }
}
