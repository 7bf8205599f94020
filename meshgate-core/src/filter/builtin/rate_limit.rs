use crate::ctx::GatewayContext;
use crate::error::GatewayError;
use crate::filter::{Filter, RATE_LIMIT_FILTER, order};
use crate::metrics::MetricsSink;
use crate::ratelimit::RateLimiterCache;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LimitType {
    Ip,
    User,
    Api,
    Service,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Algorithm {
    TokenBucket,
    SlidingWindow,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitConfig {
    #[serde(default = "default_limit_type")]
    limit_type: LimitType,
    #[serde(default = "default_rate")]
    requests_per_second: f64,
    #[serde(default)]
    timeout_ms: u64,
    #[serde(default = "default_algorithm")]
    algorithm: Algorithm,
}

fn default_limit_type() -> LimitType {
    LimitType::Service
}

fn default_rate() -> f64 {
    100.0
}

fn default_algorithm() -> Algorithm {
    Algorithm::TokenBucket
}

/// Per-rule request throttling over the shared limiter cache.
pub struct RateLimitFilter {
    limiters: Arc<RateLimiterCache>,
    metrics: Arc<dyn MetricsSink>,
}

impl RateLimitFilter {
    pub fn new(limiters: Arc<RateLimiterCache>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self { limiters, metrics }
    }

    /// Limit keys are namespaced by rule so two rules never share a bucket.
    fn limit_key(cfg: &RateLimitConfig, ctx: &GatewayContext) -> String {
        let subject = match cfg.limit_type {
            LimitType::Ip => format!("ip:{}", ctx.request.client_ip),
            LimitType::User => format!(
                "user:{}",
                ctx.request.header("userId").unwrap_or("anonymous")
            ),
            LimitType::Api => format!("api:{}", ctx.request.path),
            LimitType::Service => format!("service:{}", ctx.rule.service_id),
            LimitType::Global => "global".to_string(),
        };
        format!("{}:{}", ctx.rule.id, subject)
    }
}

#[async_trait]
impl Filter for RateLimitFilter {
    fn id(&self) -> &'static str {
        RATE_LIMIT_FILTER
    }

    fn order(&self) -> i32 {
        order::RATE_LIMIT
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let Some(fc) = ctx.rule.filter_config(RATE_LIMIT_FILTER) else {
            return Ok(());
        };

        let Ok(cfg) = serde_json::from_str::<RateLimitConfig>(&fc.config) else {
            return Ok(());
        };

        let key = Self::limit_key(&cfg, ctx);
        let admitted = match cfg.algorithm {
            Algorithm::TokenBucket => {
                self.limiters
                    .get_or_create(&key, cfg.requests_per_second)
                    .try_acquire(cfg.timeout_ms)
                    .await
            }
            Algorithm::SlidingWindow => {
                self.limiters
                    .get_or_create_window(&key, cfg.requests_per_second)
                    .allow()
                    .await
            }
        };

        if admitted {
            Ok(())
        } else {
            self.metrics.rate_limited(&key);
            Err(GatewayError::ServiceUnavailable {
                reason: "rate limit exceeded".to_string(),
            })
        }
    }
}
