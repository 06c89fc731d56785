use crate::cli::args::{ExecuteArgs, MetricsArgs, PlannerArgs, RouteArgs, RpcArgs};
use autobridge_bundler::{
    BundlerClient, EthereumClient, ExecutionResult, RouteExecutor, UserOperationBuilder,
};
use autobridge_metrics::{ethers::MetricsMiddleware, launch_metrics_exporter};
use autobridge_primitives::{
    config::{require_env, Env},
    provider::{create_http_provider, create_ws_provider, is_ws_endpoint},
    ChainRegistry, RouteRequest, UserOperationSigner, Wallet,
};
use autobridge_routing::{RouteEncoder, RoutePlanner};
use autobridge_rpc::{JsonRpcServer, RouteApiServer, RouteApiServerImpl};
use ethers::providers::Middleware;
use expanded_pathbuf::ExpandedPathBuf;
use jsonrpsee::server::ServerHandle;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

/// Loads the chain registry from `path`, the built-in registry if not set
pub fn load_registry(path: Option<&ExpandedPathBuf>) -> eyre::Result<ChainRegistry> {
    match path {
        Some(path) => {
            info!("Loading chain registry from {:?}", path.to_path_buf());
            Ok(ChainRegistry::load(path)?)
        }
        None => Ok(ChainRegistry::builtin()),
    }
}

/// Loads the registry and creates the route planner
pub fn create_planner(args: &PlannerArgs) -> eyre::Result<(Arc<ChainRegistry>, Arc<RoutePlanner>)> {
    let registry = Arc::new(args.registry()?);
    let planner = Arc::new(RoutePlanner::new(registry.clone(), args.planner_config())?);
    Ok((registry, planner))
}

pub fn launch_metrics(args: &MetricsArgs) -> eyre::Result<()> {
    if args.enable_metrics {
        launch_metrics_exporter(args.listen_address(), Some(args.labels.clone()))?;
    }
    Ok(())
}

/// Starts the routing service
///
/// # Returns
/// * `(ServerHandle, SocketAddr)` - The server stops once the handle is dropped
pub async fn launch_rpc(
    planner: PlannerArgs,
    args: RpcArgs,
    env: Env,
) -> eyre::Result<(ServerHandle, SocketAddr)> {
    info!("Starting routing service JSON-RPC server...");

    let (registry, planner) = create_planner(&planner)?;

    let mut server = JsonRpcServer::new(args.listen_address).with_cors(args.http_corsdomain);
    server.add_methods(RouteApiServerImpl { registry, planner, env }.into_rpc())?;

    let (handle, addr) = server.start().await?;
    info!("Started routing service JSON-RPC server at {addr}");

    Ok((handle, addr))
}

/// Plans the route and executes it from the smart account through the source chain bundler
pub async fn execute_route(
    route: RouteArgs,
    planner: PlannerArgs,
    args: ExecuteArgs,
    env: Env,
) -> eyre::Result<ExecutionResult> {
    let (registry, planner) = create_planner(&planner)?;
    let request = RouteRequest::from(route);
    let chain = registry.chain(&request.src_chain)?;

    let eth_client_address = match &args.eth_client_address {
        Some(address) => address.clone(),
        None => require_env(&env, &chain.rpc_env)?.to_string(),
    };

    if is_ws_endpoint(&eth_client_address) {
        let ws_client = create_ws_provider(&eth_client_address).await?;
        let eth_client = Arc::new(MetricsMiddleware::new(ws_client));
        execute_with(eth_client, registry, planner, request, args, env).await
    } else {
        let http_client = create_http_provider(&eth_client_address).await?;
        let eth_client = Arc::new(MetricsMiddleware::new(http_client));
        execute_with(eth_client, registry, planner, request, args, env).await
    }
}

async fn execute_with<M>(
    eth_client: Arc<M>,
    registry: Arc<ChainRegistry>,
    planner: Arc<RoutePlanner>,
    request: RouteRequest,
    args: ExecuteArgs,
    env: Env,
) -> eyre::Result<ExecutionResult>
where
    M: Middleware + 'static,
{
    let chain_id = registry.chain(&request.src_chain)?.chain_id;
    let config = registry.bundler_config(&request.src_chain, &env)?;
    let encoder = Arc::new(RouteEncoder::from_env(registry, &env)?);

    let wallet = Wallet::from_file(args.mnemonic_file.clone(), chain_id)?;
    info!("Smart account owner: {:?}", wallet.address());

    let builder =
        UserOperationBuilder::new(config.clone(), encoder, Arc::new(EthereumClient::new(eth_client)));
    let bundler = BundlerClient::from_config(&config).with_timeout(args.timeout);
    let build = args.build_request(wallet.address());
    let executor = RouteExecutor::new(planner, builder, Arc::new(bundler), Arc::new(wallet))?;

    let res = executor.quote_and_execute(&request, &build, &args.options()).await?;
    info!("User operation {} handed to {}", res.user_operation_hash, config.bundler_url);

    Ok(res)
}
