use crate::filter::Filter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Explicit filter registration, keyed by filter id.
///
/// Filters are registered once at startup; there is no runtime discovery.
/// The registry only resolves ids to instances — the relative position of
/// equal-order filters in a chain is decided by the order the chain factory
/// appends them.
#[derive(Default)]
pub struct FilterRegistry {
    by_id: HashMap<&'static str, Arc<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering the same id twice replaces the earlier instance.
    pub fn register(&mut self, filter: Arc<dyn Filter>) {
        let id = filter.id();
        info!(event = "filter_registered", filter = id, order = filter.order());
        self.by_id.insert(id, filter);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Filter>> {
        self.by_id.get(id).cloned()
    }
}
