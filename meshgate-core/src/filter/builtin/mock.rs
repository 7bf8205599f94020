use crate::ctx::{GatewayContext, GatewayResponse};
use crate::error::GatewayError;
use crate::filter::{Filter, MOCK_FILTER, order};
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MockConfig {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    body: String,
    #[serde(default = "default_content_type")]
    content_type: String,
}

fn default_status() -> u16 {
    200
}

fn default_content_type() -> String {
    "application/json".to_string()
}

/// Serves a canned response for rules that stub their backend out.
#[derive(Debug, Default)]
pub struct MockFilter;

#[async_trait]
impl Filter for MockFilter {
    fn id(&self) -> &'static str {
        MOCK_FILTER
    }

    fn order(&self) -> i32 {
        order::MOCK
    }

    async fn filter(&self, ctx: &mut GatewayContext) -> Result<(), GatewayError> {
        let Some(fc) = ctx.rule.filter_config(MOCK_FILTER) else {
            return Ok(());
        };

        let Ok(cfg) = serde_json::from_str::<MockConfig>(&fc.config) else {
            return Ok(());
        };

        let status = StatusCode::from_u16(cfg.status).unwrap_or(StatusCode::OK);
        ctx.write_response(
            GatewayResponse::new(status)
                .with_body(cfg.body)
                .with_content_type(&cfg.content_type),
        );
        ctx.terminated();
        Ok(())
    }
}
