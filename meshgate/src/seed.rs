use anyhow::Context;
use meshgate_core::registry::{Registry, Rule, ServiceDefinition, ServiceInstance};
use serde::Deserialize;

/// Static registry content loaded at startup.
///
/// The registration RPC owns the registry at runtime; the seed file exists
/// for local runs and fixed deployments.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedFile {
    pub services: Vec<ServiceDefinition>,
    pub instances: Vec<ServiceInstance>,
    pub rules: Vec<Rule>,
}

pub fn load(path: &str) -> anyhow::Result<SeedFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {path}"))?;
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse seed file {path}"))
}

pub fn apply(registry: &Registry, seed: SeedFile) {
    let counts = (seed.services.len(), seed.instances.len(), seed.rules.len());

    for def in seed.services {
        registry.put_service(def);
    }
    for inst in seed.instances {
        registry.put_instance(inst);
    }
    for rule in seed.rules {
        registry.put_rule(rule);
    }

    tracing::info!(
        event = "registry_seeded",
        services = counts.0,
        instances = counts.1,
        rules = counts.2
    );
}
