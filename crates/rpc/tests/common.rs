use autobridge_primitives::{ChainRegistry, Env};
use autobridge_routing::{PlannerConfig, RoutePlanner};
use autobridge_rpc::{JsonRpcServer, RouteApiServer, RouteApiServerImpl};
use jsonrpsee::{
    http_client::{HttpClient, HttpClientBuilder},
    server::ServerHandle,
};
use std::sync::Arc;

/// Starts the route service on a free local port
///
/// # Returns
/// * `(ServerHandle, HttpClient)` - Keep the handle alive for as long as the client is used
pub async fn start_route_service(env: Env) -> eyre::Result<(ServerHandle, HttpClient)> {
    let registry = Arc::new(ChainRegistry::builtin());
    let planner = Arc::new(RoutePlanner::new(registry.clone(), PlannerConfig::default())?);

    let mut server = JsonRpcServer::new("127.0.0.1:0".into()).with_cors(vec!["*".into()]);
    server.add_methods(RouteApiServerImpl { registry, planner, env }.into_rpc())?;

    let (handle, addr) = server.start().await?;
    let client = HttpClientBuilder::default().build(format!("http://{addr}"))?;
    Ok((handle, client))
}
