use serde::{Deserialize, Serialize};

/// Backend protocols the gateway can front. HTTP only for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Http
    }
}

/// A registered backend service, keyed by `service_id:version`.
///
/// Immutable once registered; re-registration replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub service_id: String,
    pub version: String,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub env_type: String,
    #[serde(default)]
    pub pattern_path: String,
}

impl ServiceDefinition {
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.service_id, self.version)
    }
}

/// A single addressable instance of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub unique_id: String,
    pub ip: String,
    pub port: u16,
    /// Registration time, milliseconds since the Unix epoch.
    pub register_time: u64,
    pub version: String,
    /// Reserved for weighted strategies; carried but unused by random and
    /// round-robin.
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub gray: bool,
    #[serde(default = "default_enable")]
    pub enable: bool,
}

impl ServiceInstance {
    /// `ip:port`, the identity of the instance within its service.
    pub fn service_instance_id(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

fn default_weight() -> u32 {
    100
}

fn default_enable() -> bool {
    true
}

/// Per-rule filter activation with an opaque JSON payload.
///
/// Set identity within a rule is the `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub id: String,
    #[serde(default)]
    pub config: String,
}

/// Routing + filter policy attached to a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub protocol: Protocol,
    pub service_id: String,
    #[serde(default)]
    pub prefix: String,
    /// Exact-path literals; consulted before prefix matching.
    #[serde(default)]
    pub paths: Vec<String>,
    /// Lower runs earlier; ties broken by `id` lexicographic.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub filter_configs: Vec<FilterConfig>,
}

impl Rule {
    pub fn filter_config(&self, filter_id: &str) -> Option<&FilterConfig> {
        self.filter_configs.iter().find(|fc| fc.id == filter_id)
    }

    /// Total ordering across rules of a service.
    pub fn ordering_key(&self) -> (i32, &str) {
        (self.order, self.id.as_str())
    }
}
