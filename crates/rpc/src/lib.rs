//! Route quoting JSON-RPC service (`route` namespace)

pub mod error;
mod route;
mod route_api;
mod rpc;

pub use route_api::{
    EnvReport, HealthStatus, QuoteRequest, RouteApiClient, RouteApiServer, RouteApiServerImpl,
    ValidationReport,
};
pub use rpc::JsonRpcServer;
