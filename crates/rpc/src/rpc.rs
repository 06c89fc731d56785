use autobridge_metrics::rpc::MetricsLayer;
use hyper::{http::HeaderValue, Method};
use jsonrpsee::{
    server::{middleware::rpc::RpcServiceBuilder, ServerBuilder, ServerHandle},
    Methods,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

/// JsonRpcServer is a wrapper around the `jsonrpsee` [ServerBuilder](ServerBuilder).
pub struct JsonRpcServer {
    /// The address to listen on.
    listen_address: String,
    /// The [cors layer](CorsLayer) to filter requests.
    cors_layer: Option<CorsLayer>,
    /// The RPC methods to be exposed.
    methods: Methods,
}

impl JsonRpcServer {
    /// Create a new JsonRpcServer.
    ///
    /// # Arguments
    /// * `listen_address: String` - The address to listen on (port 0 picks a free port).
    ///
    /// # Returns
    /// * `Self` - A new [JsonRpcServer](JsonRpcServer) instance.
    pub fn new(listen_address: String) -> Self {
        Self { listen_address, cors_layer: None, methods: Methods::new() }
    }

    /// Add a cors layer to the server.
    ///
    /// # Arguments
    /// * `cors_domain: Vec<String>` - A list of CORS filters in the form of String.
    ///
    /// # Returns
    /// * `Self` - A new [JsonRpcServer](JsonRpcServer) instance.
    pub fn with_cors(mut self, cors_domain: Vec<String>) -> Self {
        let cors_layer = if cors_domain.iter().any(|d| d == "*") {
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_origin(Any)
        } else {
            let mut origins: Vec<HeaderValue> = vec![];

            for domain in cors_domain.iter() {
                if let Ok(origin) = domain.parse::<HeaderValue>() {
                    origins.push(origin);
                }
            }

            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_origin(AllowOrigin::list(origins))
        };

        self.cors_layer = Some(cors_layer);
        self
    }

    /// Add methods to the RPC server.
    ///
    /// # Arguments
    /// * `methods: impl Into<Methods>` - The RPC methods to be exposed.
    ///
    /// # Returns
    /// * `eyre::Result<()>` - Fails if a method is already registered.
    pub fn add_methods(&mut self, methods: impl Into<Methods>) -> eyre::Result<()> {
        self.methods.merge(methods).map_err(|err| eyre::eyre!(err))
    }

    /// Start the [json RPC server](JsonRpcServer)
    ///
    /// Requests are counted by the [metrics layer](MetricsLayer), a no-op until a recorder is
    /// installed.
    ///
    /// # Returns
    /// * `eyre::Result<(ServerHandle, SocketAddr)>` - The [handle](ServerHandle) of the server
    ///   and the address it is bound to.
    pub async fn start(&self) -> eyre::Result<(ServerHandle, SocketAddr)> {
        let http_middleware = ServiceBuilder::new().option_layer(self.cors_layer.clone());
        let rpc_middleware = RpcServiceBuilder::new().layer(MetricsLayer::new());

        let server = ServerBuilder::default()
            .set_http_middleware(http_middleware)
            .set_rpc_middleware(rpc_middleware)
            .build(self.listen_address.as_str())
            .await?;
        let addr = server.local_addr()?;
        info!("Route JSON-RPC server listening on {addr}");

        Ok((server.start(self.methods.clone()), addr))
    }
}
