use crate::registry::types::Rule;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable view over all registered rules.
///
/// Rebuilt from scratch on every rule mutation and republished through an
/// atomic pointer swap, so readers never observe a partially updated index.
#[derive(Debug, Default)]
pub struct RuleTable {
    by_id: HashMap<String, Arc<Rule>>,
    /// `"{service_id}.{path}"` → rule, for the exact-path fast path.
    by_path: HashMap<String, Arc<Rule>>,
    /// Per-service rules sorted by (order, id).
    by_service: HashMap<String, Vec<Arc<Rule>>>,
}

impl RuleTable {
    pub fn build(rules: &HashMap<String, Arc<Rule>>) -> Self {
        let mut by_id = HashMap::with_capacity(rules.len());
        let mut by_path = HashMap::new();
        let mut by_service: HashMap<String, Vec<Arc<Rule>>> = HashMap::new();

        for rule in rules.values() {
            by_id.insert(rule.id.clone(), rule.clone());

            for path in &rule.paths {
                by_path.insert(format!("{}.{}", rule.service_id, path), rule.clone());
            }

            by_service
                .entry(rule.service_id.clone())
                .or_default()
                .push(rule.clone());
        }

        for rules in by_service.values_mut() {
            rules.sort_by(|a, b| a.ordering_key().cmp(&b.ordering_key()));
        }

        Self {
            by_id,
            by_path,
            by_service,
        }
    }

    pub fn rule(&self, rule_id: &str) -> Option<Arc<Rule>> {
        self.by_id.get(rule_id).cloned()
    }

    pub fn rule_by_path(&self, service_id: &str, path: &str) -> Option<Arc<Rule>> {
        self.by_path
            .get(&format!("{service_id}.{path}"))
            .cloned()
    }

    pub fn rules_by_service(&self, service_id: &str) -> Vec<Arc<Rule>> {
        self.by_service
            .get(service_id)
            .cloned()
            .unwrap_or_default()
    }
}
