pub use crate::route::RouteApiServerImpl;
use autobridge_primitives::{MissingEnvVar, RoutePlan, ValidationIssue};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Liveness of the service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Milliseconds since the unix epoch
    pub timestamp: u64,
}

/// Environment variables of the registry that are not set
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvReport {
    /// `ok` when nothing is missing, `error` otherwise
    pub status: String,
    pub missing: Vec<MissingEnvVar>,
}

/// Outcome of a route plan validation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// The parsed plan, when it is valid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<RoutePlan>,
}

/// Quote request, every missing field takes the service default
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub src_chain: Option<String>,
    pub dst_chain: Option<String>,
    pub token_in: Option<String>,
    pub token_out: Option<String>,
    pub amount_in: Option<String>,
    pub recipient: Option<String>,
}

/// The `route` namespace RPC methods trait
#[rpc(client, server, namespace = "route")]
pub trait RouteApi {
    /// Liveness probe
    ///
    /// # Returns
    /// * `RpcResult<HealthStatus>` - `ok` and the current time
    #[method(name = "health")]
    async fn health(&self) -> RpcResult<HealthStatus>;

    /// Reports the environment variables the chain registry needs but that are not set.
    ///
    /// # Returns
    /// * `RpcResult<EnvReport>` - The missing variables with the chain and purpose of each
    #[method(name = "envCheck")]
    async fn env_check(&self) -> RpcResult<EnvReport>;

    /// Validate a route plan against its schema.
    ///
    /// # Arguments
    /// * `plan: Value` - The route plan as JSON.
    ///
    /// # Returns
    /// * `RpcResult<ValidationReport>` - Every issue found, a malformed plan is not an RPC error
    #[method(name = "validate")]
    async fn validate(&self, plan: Value) -> RpcResult<ValidationReport>;

    /// Quote a route.
    ///
    /// # Arguments
    /// * `request: Option<QuoteRequest>` - The route to quote, missing fields take the defaults
    ///   (base-sepolia to optimism-sepolia, 1 WETH to USDCx, to the dead address)
    ///
    /// # Returns
    /// * `RpcResult<RoutePlan>` - The validated route plan
    #[method(name = "quote")]
    async fn quote(&self, request: Option<QuoteRequest>) -> RpcResult<RoutePlan>;
}
