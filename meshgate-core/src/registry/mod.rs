mod table;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use table::RuleTable;
use tracing::info;

/// Process-wide, in-memory registry of services, instances and rules.
///
/// Readers are lock-free: definitions and instances live in sharded maps,
/// rules in a copy-on-write [`RuleTable`] snapshot. Writers serialize among
/// themselves (rule writers on a mutex, the rest on map shards) but never
/// block readers; a concurrent read observes pre- or post-state of any
/// mutation, never a partial state.
pub struct Registry {
    definitions: DashMap<String, Arc<ServiceDefinition>>,
    /// Instances per unique id, keyed by `ip:port` so enumeration order is
    /// deterministic between mutations.
    instances: DashMap<String, BTreeMap<String, Arc<ServiceInstance>>>,
    /// Writer-side source of truth for rules.
    rules: Mutex<HashMap<String, Arc<Rule>>>,
    table: ArcSwap<RuleTable>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            instances: DashMap::new(),
            rules: Mutex::new(HashMap::new()),
            table: ArcSwap::from_pointee(RuleTable::default()),
        }
    }
}

/// Service definitions
impl Registry {
    pub fn put_service(&self, def: ServiceDefinition) {
        let unique_id = def.unique_id();
        info!(event = "service_registered", unique_id = %unique_id);
        self.definitions.insert(unique_id, Arc::new(def));
    }

    pub fn remove_service(&self, unique_id: &str) {
        info!(event = "service_removed", unique_id = %unique_id);
        self.definitions.remove(unique_id);
    }

    pub fn get_definition(&self, unique_id: &str) -> Option<Arc<ServiceDefinition>> {
        self.definitions.get(unique_id).map(|e| e.value().clone())
    }
}

/// Service instances
impl Registry {
    pub fn put_instance(&self, inst: ServiceInstance) {
        let mut set = self.instances.entry(inst.unique_id.clone()).or_default();
        set.insert(inst.service_instance_id(), Arc::new(inst));
    }

    pub fn remove_instance(&self, unique_id: &str, instance_id: &str) {
        if let Some(mut set) = self.instances.get_mut(unique_id) {
            set.remove(instance_id);
        }
    }

    /// Instances of a service, sorted by `ip:port`.
    pub fn get_instances(&self, unique_id: &str) -> Vec<Arc<ServiceInstance>> {
        self.instances
            .get(unique_id)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }
}

/// Rules
impl Registry {
    pub fn put_rule(&self, rule: Rule) {
        let mut rules = self.rules.lock().expect("rule writer lock poisoned");
        rules.insert(rule.id.clone(), Arc::new(rule));
        self.table.store(Arc::new(RuleTable::build(&rules)));
    }

    /// Returns true when the rule existed.
    pub fn remove_rule(&self, rule_id: &str) -> bool {
        let mut rules = self.rules.lock().expect("rule writer lock poisoned");
        let removed = rules.remove(rule_id).is_some();
        if removed {
            self.table.store(Arc::new(RuleTable::build(&rules)));
        }
        removed
    }

    pub fn get_rule(&self, rule_id: &str) -> Option<Arc<Rule>> {
        self.table.load().rule(rule_id)
    }

    /// Exact-path fast path: the rule indexed at `"{service_id}.{path}"`.
    pub fn get_rule_by_path(&self, service_id: &str, path: &str) -> Option<Arc<Rule>> {
        self.table.load().rule_by_path(service_id, path)
    }

    /// All rules of a service, ordered by (order, id).
    pub fn get_rules_by_service(&self, service_id: &str) -> Vec<Arc<Rule>> {
        self.table.load().rules_by_service(service_id)
    }
}
