mod types;


pub use types::*;

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

/// Load and validate a [`GatewayConfig`] from a YAML file.
pub fn load(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let cfg: GatewayConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    validate(&cfg)?;
    Ok(cfg)
}

/// Reject configs before any runtime construction sees them.
pub fn validate(cfg: &GatewayConfig) -> Result<(), ConfigError> {
    if cfg.port == 0 {
        return Err(ConfigError::Invalid {
            reason: "port must be non-zero".into(),
        });
    }

    if cfg.invoker_timeout_ms == 0 {
        return Err(ConfigError::Invalid {
            reason: "invoker_timeout_ms must be at least 1".into(),
        });
    }

    if cfg.discovery.namespace.is_empty() {
        return Err(ConfigError::Invalid {
            reason: "discovery.namespace must not be empty".into(),
        });
    }

    if cfg.discovery.cluster_domain.is_empty() {
        return Err(ConfigError::Invalid {
            reason: "discovery.cluster_domain must not be empty".into(),
        });
    }

    Ok(())
}

/// In-mesh DNS name for a service: `<service>.<namespace>.<cluster_domain>`.
pub fn service_dns(cfg: &DiscoveryConfig, service_name: &str) -> String {
    format!(
        "{}.{}.{}",
        service_name, cfg.namespace, cfg.cluster_domain
    )
}
