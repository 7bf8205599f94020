use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, IP_SECURITY_FILTER, order};
use async_trait::async_trait;
use ipnet::IpNet;
use serde::Deserialize;
use std::net::IpAddr;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IpSecurityConfig {
    whitelist: Vec<String>,
    blacklist: Vec<String>,
}

/// A single list entry: a literal address or a CIDR range.
#[derive(Debug, Clone)]
enum IpMatcher {
    Literal(IpAddr),
    Cidr(IpNet),
}

impl IpMatcher {
    fn parse(entry: &str) -> Option<Self> {
        if entry.contains('/') {
            entry.parse::<IpNet>().map(IpMatcher::Cidr).ok()
        } else {
            entry.parse::<IpAddr>().map(IpMatcher::Literal).ok()
        }
    }

    fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpMatcher::Literal(addr) => addr == ip,
            IpMatcher::Cidr(net) => net.contains(ip),
        }
    }
}

fn parse_list(rule_id: &str, entries: &[String]) -> Vec<IpMatcher> {
    entries
        .iter()
        .filter_map(|entry| {
            let matcher = IpMatcher::parse(entry);
            if matcher.is_none() {
                warn!(event = "invalid_ip_entry", rule = %rule_id, entry = %entry);
            }
            matcher
        })
        .collect()
}

/// Enforces per-rule IP whitelist/blacklist. Any blacklist hit takes
/// precedence; when a whitelist is configured, only addresses on it pass.
#[derive(Debug, Default)]
pub struct IpSecurityFilter;

#[async_trait]
impl Filter for IpSecurityFilter {
    fn id(&self) -> &'static str {
        IP_SECURITY_FILTER
    }

    fn order(&self) -> i32 {
        order::IP_SECURITY
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let Some(fc) = ctx.rule.filter_config(IP_SECURITY_FILTER) else {
            return Ok(());
        };

        let cfg: IpSecurityConfig = serde_json::from_str(&fc.config).unwrap_or_default();
        let ip = ctx.request.client_ip;

        let blacklist = parse_list(&ctx.rule.id, &cfg.blacklist);
        if blacklist.iter().any(|m| m.matches(&ip)) {
            return Err(GatewayError::Blacklist { ip });
        }

        let whitelist = parse_list(&ctx.rule.id, &cfg.whitelist);
        if !whitelist.is_empty() && !whitelist.iter().any(|m| m.matches(&ip)) {
            return Err(GatewayError::Whitelist { ip });
        }

        Ok(())
    }
}
