use super::*;
use crate::error::GatewayError;
use crate::registry::{Protocol, Rule};
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode, Uri};
use pretty_assertions::assert_eq;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

fn request() -> GatewayRequest {
    GatewayRequest {
        unique_id: "users:1.0".to_string(),
        method: Method::GET,
        uri: Uri::from_static("/users/profile"),
        path: "/users/profile".to_string(),
        client_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        host: Some("gateway.local".to_string()),
        headers: HeaderMap::new(),
        body: Bytes::new(),
        content_type: None,
        charset: None,
        modify_host: None,
    }
}

fn rule() -> Arc<Rule> {
    Arc::new(Rule {
        id: "r1".to_string(),
        name: "users".to_string(),
        protocol: Protocol::Http,
        service_id: "users".to_string(),
        prefix: "/users".to_string(),
        paths: vec![],
        order: 0,
        filter_configs: vec![],
    })
}

fn context() -> GatewayContext {
    GatewayContext::new(Protocol::Http, true, request(), rule())
}

#[test]
fn write_then_terminate_is_the_happy_path() {
    // Arrange
    let mut ctx = context();
    assert_eq!(ctx.state(), ContextState::Running);

    // Act
    ctx.write_response(GatewayResponse::new(StatusCode::OK));
    let after_write = ctx.state();
    ctx.terminated();

    // Assert
    assert_eq!(after_write, ContextState::Written);
    assert_eq!(ctx.state(), ContextState::Terminated);
    assert!(ctx.response.is_some());
    assert!(ctx.throwable.is_none());
}

#[test]
fn first_response_write_wins() {
    // Arrange
    let mut ctx = context();

    // Act
    ctx.write_response(GatewayResponse::new(StatusCode::OK));
    ctx.write_response(GatewayResponse::new(StatusCode::IM_A_TEAPOT));

    // Assert
    assert_eq!(ctx.response.as_ref().map(|r| r.status), Some(StatusCode::OK));
}

#[test]
fn fail_records_throwable_and_terminates() {
    // Arrange
    let mut ctx = context();

    // Act
    ctx.fail(GatewayError::ServiceUnavailable {
        reason: "rate limited".to_string(),
    });

    // Assert
    assert!(ctx.is_terminated());
    assert!(ctx.response.is_none());
    assert!(ctx.throwable.is_some());
}

#[test]
fn a_written_context_never_gains_a_throwable() {
    // Arrange
    let mut ctx = context();
    ctx.write_response(GatewayResponse::new(StatusCode::OK));

    // Act
    ctx.fail(GatewayError::ServiceUnavailable {
        reason: "late failure".to_string(),
    });

    // Assert: exactly one of response/throwable survives.
    assert!(ctx.response.is_some());
    assert!(ctx.throwable.is_none());
    assert!(ctx.is_terminated());
}

#[test]
fn terminated_is_idempotent() {
    // Arrange
    let mut ctx = context();

    // Act
    ctx.terminated();
    ctx.terminated();

    // Assert
    assert!(ctx.is_terminated());
}
