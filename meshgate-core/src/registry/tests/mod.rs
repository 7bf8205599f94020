use super::*;
use pretty_assertions::assert_eq;

fn definition(service_id: &str, version: &str) -> ServiceDefinition {
    ServiceDefinition {
        service_id: service_id.to_string(),
        version: version.to_string(),
        protocol: Protocol::Http,
        env_type: "prod".to_string(),
        pattern_path: "/**".to_string(),
    }
}

fn instance(unique_id: &str, ip: &str, port: u16) -> ServiceInstance {
    ServiceInstance {
        unique_id: unique_id.to_string(),
        ip: ip.to_string(),
        port,
        register_time: 1_700_000_000_000,
        version: "1.0".to_string(),
        weight: 100,
        gray: false,
        enable: true,
    }
}

fn rule(id: &str, service_id: &str, order: i32, prefix: &str, paths: &[&str]) -> Rule {
    Rule {
        id: id.to_string(),
        name: format!("rule-{id}"),
        protocol: Protocol::Http,
        service_id: service_id.to_string(),
        prefix: prefix.to_string(),
        paths: paths.iter().map(|p| p.to_string()).collect(),
        order,
        filter_configs: vec![],
    }
}

#[test]
fn definition_is_replaced_wholesale() {
    // Arrange
    let registry = Registry::new();
    registry.put_service(definition("users", "1.0"));

    // Act
    let mut updated = definition("users", "1.0");
    updated.env_type = "staging".to_string();
    registry.put_service(updated);

    // Assert
    let def = registry.get_definition("users:1.0").expect("definition");
    assert_eq!(def.env_type, "staging");
}

#[test]
fn instances_enumerate_sorted_by_instance_id() {
    // Arrange
    let registry = Registry::new();
    registry.put_instance(instance("users:1.0", "10.0.0.3", 8080));
    registry.put_instance(instance("users:1.0", "10.0.0.1", 8080));
    registry.put_instance(instance("users:1.0", "10.0.0.2", 8080));

    // Act
    let ids: Vec<String> = registry
        .get_instances("users:1.0")
        .iter()
        .map(|i| i.service_instance_id())
        .collect();

    // Assert
    assert_eq!(ids, vec!["10.0.0.1:8080", "10.0.0.2:8080", "10.0.0.3:8080"]);
}

#[test]
fn remove_instance_shrinks_the_set() {
    // Arrange
    let registry = Registry::new();
    registry.put_instance(instance("users:1.0", "10.0.0.1", 8080));
    registry.put_instance(instance("users:1.0", "10.0.0.2", 8080));

    // Act
    registry.remove_instance("users:1.0", "10.0.0.1:8080");

    // Assert
    assert_eq!(registry.get_instances("users:1.0").len(), 1);
}

#[test]
fn exact_path_index_hits_only_listed_paths() {
    // Arrange
    let registry = Registry::new();
    registry.put_rule(rule("r1", "users", 0, "/users", &["/users/login"]));

    // Act & Assert
    assert!(registry.get_rule_by_path("users", "/users/login").is_some());
    assert!(registry.get_rule_by_path("users", "/users/logout").is_none());
    assert!(registry.get_rule_by_path("orders", "/users/login").is_none());
}

#[test]
fn service_rules_are_ordered_by_order_then_id() {
    // Arrange
    let registry = Registry::new();
    registry.put_rule(rule("rb", "users", 5, "/u", &[]));
    registry.put_rule(rule("ra", "users", 5, "/u", &[]));
    registry.put_rule(rule("rc", "users", 1, "/u", &[]));

    // Act
    let ids: Vec<String> = registry
        .get_rules_by_service("users")
        .iter()
        .map(|r| r.id.clone())
        .collect();

    // Assert
    assert_eq!(ids, vec!["rc", "ra", "rb"]);
}

#[test]
fn removing_a_rule_drops_its_indexes() {
    // Arrange
    let registry = Registry::new();
    registry.put_rule(rule("r1", "users", 0, "/users", &["/users/login"]));

    // Act
    let removed = registry.remove_rule("r1");

    // Assert
    assert!(removed);
    assert!(registry.get_rule("r1").is_none());
    assert!(registry.get_rule_by_path("users", "/users/login").is_none());
    assert!(registry.get_rules_by_service("users").is_empty());
}
