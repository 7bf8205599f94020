use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, GRAY_FILTER, order};
use ahash::RandomState;
use async_trait::async_trait;
use serde::Deserialize;

/// Deterministic, fast hash for routing decisions.
///
/// Fixed seeds: stable across restarts and processes, not
/// security-sensitive.
static HASHER: RandomState = RandomState::with_seeds(1, 2, 3, 4);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GrayConfig {
    /// Percentage of traffic hashed into the gray lane; 0 disables hashing.
    gray_ratio: u32,
}

/// Marks the request as gray from an explicit header, by a stable hash of
/// the client IP when the rule configures a gray ratio, or by the gateway's
/// own gray flag.
#[derive(Debug, Default)]
pub struct GrayFilter {
    /// Gateway-level default for requests with no gray marker of their own.
    default_gray: bool,
}

impl GrayFilter {
    pub fn new(default_gray: bool) -> Self {
        Self { default_gray }
    }
}

#[async_trait]
impl Filter for GrayFilter {
    fn id(&self) -> &'static str {
        GRAY_FILTER
    }

    fn order(&self) -> i32 {
        order::GRAY
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        if ctx.request.header("gray") == Some("true") {
            ctx.gray = true;
            return Ok(());
        }

        if let Some(fc) = ctx.rule.filter_config(GRAY_FILTER)
            && let Ok(cfg) = serde_json::from_str::<GrayConfig>(&fc.config)
            && cfg.gray_ratio > 0
        {
            let hash = HASHER.hash_one(ctx.request.client_ip.to_string());
            ctx.gray = (hash % 100) < cfg.gray_ratio.min(100) as u64;
            return Ok(());
        }

        ctx.gray = self.default_gray;
        Ok(())
    }
}
