use crate::{
    error::JsonRpcError,
    route_api::{EnvReport, HealthStatus, QuoteRequest, RouteApiServer, ValidationReport},
};
use async_trait::async_trait;
use autobridge_primitives::{
    constants::rpc::{AMOUNT_IN, DST_CHAIN, RECIPIENT, SRC_CHAIN, TOKEN_IN, TOKEN_OUT},
    ChainRegistry, Env, RoutePlan, RouteRequest, ValidationIssue,
};
use autobridge_routing::{now_ms, RoutePlanner};
use jsonrpsee::core::RpcResult;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

impl From<QuoteRequest> for RouteRequest {
    fn from(req: QuoteRequest) -> Self {
        Self {
            src_chain: req.src_chain.unwrap_or_else(|| SRC_CHAIN.into()),
            dst_chain: req.dst_chain.unwrap_or_else(|| DST_CHAIN.into()),
            token_in: req.token_in.unwrap_or_else(|| TOKEN_IN.into()),
            token_out: req.token_out.unwrap_or_else(|| TOKEN_OUT.into()),
            amount_in: req.amount_in.unwrap_or_else(|| AMOUNT_IN.into()),
            recipient: req.recipient.unwrap_or_else(|| RECIPIENT.into()),
        }
    }
}

/// Route service backed by a shared planner
///
/// The environment snapshot is taken once, when the service is built.
pub struct RouteApiServerImpl {
    pub registry: Arc<ChainRegistry>,
    pub planner: Arc<RoutePlanner>,
    pub env: Env,
}

#[async_trait]
impl RouteApiServer for RouteApiServerImpl {
    async fn health(&self) -> RpcResult<HealthStatus> {
        Ok(HealthStatus { status: "ok".into(), timestamp: now_ms() })
    }

    async fn env_check(&self) -> RpcResult<EnvReport> {
        let missing = self.registry.missing_env_vars(&self.env);
        let status = if missing.is_empty() { "ok" } else { "error" };
        Ok(EnvReport { status: status.into(), missing })
    }

    async fn validate(&self, plan: Value) -> RpcResult<ValidationReport> {
        let plan: RoutePlan = match serde_json::from_value(plan) {
            Ok(plan) => plan,
            Err(err) => {
                return Ok(ValidationReport {
                    valid: false,
                    issues: vec![ValidationIssue { path: "plan".into(), message: err.to_string() }],
                    plan: None,
                })
            }
        };

        Ok(match plan.validate() {
            Ok(()) => ValidationReport { valid: true, issues: vec![], plan: Some(plan) },
            Err(issues) => {
                debug!("Route plan {:?} has {} issues", plan.id, issues.len());
                ValidationReport { valid: false, issues, plan: None }
            }
        })
    }

    async fn quote(&self, request: Option<QuoteRequest>) -> RpcResult<RoutePlan> {
        let request = RouteRequest::from(request.unwrap_or_default());
        let plan = self.planner.plan(&request).map_err(JsonRpcError::from)?;
        info!(
            "Quoted {} {} on {} to {} on {}: min out {}",
            request.amount_in,
            request.token_in,
            request.src_chain,
            request.token_out,
            request.dst_chain,
            plan.quote.min_amount_out
        );
        Ok(plan)
    }
}
