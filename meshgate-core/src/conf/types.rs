use serde::{Deserialize, Serialize};

/// Top-level gateway configuration, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listen port of the HTTP front-end.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether this gateway instance serves gray traffic by default when a
    /// request carries no gray marker of its own.
    #[serde(default)]
    pub gray: bool,

    /// Default backend invocation timeout, overridable per rule.
    #[serde(default = "default_invoker_timeout_ms")]
    pub invoker_timeout_ms: u64,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Service-DNS resolution settings for the surrounding mesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_cluster_domain")]
    pub cluster_domain: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Directory for the daily-rolling log file. Logs go to stdout when unset.
    #[serde(default)]
    pub dir: Option<String>,

    /// Default env-filter directive when RUST_LOG is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_port() -> u16 {
    8080
}

fn default_invoker_timeout_ms() -> u64 {
    500
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_cluster_domain() -> String {
    "svc.cluster.local".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            gray: false,
            invoker_timeout_ms: default_invoker_timeout_ms(),
            discovery: DiscoveryConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            cluster_domain: default_cluster_domain(),
        }
    }
}

impl LogConfig {
    pub fn filter_or_default(&self) -> &str {
        if self.filter.is_empty() {
            "info"
        } else {
            &self.filter
        }
    }
}
