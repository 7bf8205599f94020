use super::*;
use crate::registry::ServiceInstance;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::sync::Arc;

fn instance(ip: &str, gray: bool, enable: bool) -> Arc<ServiceInstance> {
    Arc::new(ServiceInstance {
        unique_id: "users:1.0".to_string(),
        ip: ip.to_string(),
        port: 8080,
        register_time: 1_700_000_000_000,
        version: "1.0".to_string(),
        weight: 100,
        gray,
        enable,
    })
}

#[test]
fn round_robin_rotates_in_instance_order() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![
        instance("10.0.0.1", false, true),
        instance("10.0.0.2", false, true),
        instance("10.0.0.3", false, true),
    ];

    // Act
    let picks: Vec<String> = (0..5)
        .map(|_| {
            balancer
                .select(StrategyKind::RoundRobin, "users", &instances, false)
                .expect("instance")
                .ip
                .clone()
        })
        .collect();

    // Assert
    assert_eq!(
        picks,
        vec!["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.1", "10.0.0.2"]
    );
}

#[test]
fn round_robin_covers_every_instance_once_per_cycle() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![
        instance("10.0.0.1", false, true),
        instance("10.0.0.2", false, true),
        instance("10.0.0.3", false, true),
        instance("10.0.0.4", false, true),
    ];

    // Act
    let cycle: HashSet<String> = (0..4)
        .map(|_| {
            balancer
                .select(StrategyKind::RoundRobin, "users", &instances, false)
                .expect("instance")
                .ip
                .clone()
        })
        .collect();

    // Assert
    assert_eq!(cycle.len(), 4);
}

#[test]
fn cursors_are_independent_per_service() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![
        instance("10.0.0.1", false, true),
        instance("10.0.0.2", false, true),
    ];

    // Act
    let a = balancer
        .select(StrategyKind::RoundRobin, "users", &instances, false)
        .expect("instance");
    let b = balancer
        .select(StrategyKind::RoundRobin, "orders", &instances, false)
        .expect("instance");

    // Assert: each service starts its own rotation.
    assert_eq!(a.ip, "10.0.0.1");
    assert_eq!(b.ip, "10.0.0.1");
}

#[test]
fn disabled_instances_are_never_chosen() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![
        instance("10.0.0.1", false, false),
        instance("10.0.0.2", false, true),
    ];

    // Act & Assert
    for _ in 0..10 {
        let pick = balancer
            .select(StrategyKind::Random, "users", &instances, false)
            .expect("instance");
        assert_eq!(pick.ip, "10.0.0.2");
    }
}

#[test]
fn gray_requests_only_reach_gray_instances() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![
        instance("10.0.0.1", false, true),
        instance("10.0.0.2", true, true),
    ];

    // Act & Assert
    for _ in 0..10 {
        let gray_pick = balancer
            .select(StrategyKind::Random, "users", &instances, true)
            .expect("instance");
        assert_eq!(gray_pick.ip, "10.0.0.2");

        let normal_pick = balancer
            .select(StrategyKind::Random, "users", &instances, false)
            .expect("instance");
        assert_eq!(normal_pick.ip, "10.0.0.1");
    }
}

#[test]
fn empty_eligible_set_is_an_error() {
    // Arrange
    let balancer = LoadBalancer::new();
    let instances = vec![instance("10.0.0.1", false, false)];

    // Act
    let result = balancer.select(StrategyKind::Random, "users", &instances, false);

    // Assert
    assert!(matches!(
        result,
        Err(crate::error::GatewayError::ServiceInstanceNotFound { .. })
    ));
}

#[test]
fn unknown_strategy_name_defaults_to_random() {
    assert_eq!(StrategyKind::parse("weighted"), StrategyKind::Random);
    assert_eq!(StrategyKind::parse("round_robin"), StrategyKind::RoundRobin);
    assert_eq!(StrategyKind::parse("random"), StrategyKind::Random);
}
