#![allow(dead_code)]

use async_trait::async_trait;
use autobridge_bundler::{
    BundlerClient, ChainReader, RouteExecutor, UserOperationBuilder,
};
use autobridge_primitives::{
    config::Env, AutoBridgeResult, ChainRegistry, PoolConfig, UserOperation, Wallet,
};
use autobridge_routing::{PlannerConfig, RouteEncoder, RoutePlanner};
use ethers::types::{Address, U256};
use jsonrpsee::{
    core::RpcResult,
    proc_macros::rpc,
    server::{ServerBuilder, ServerHandle},
    types::{ErrorObject, ErrorObjectOwned},
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

// Testing key
pub const KEY_PHRASE: &str = "test test test test test test test test test test test junk";
pub const CHAIN_ID: u64 = 84_532;
pub const ENTRY_POINT: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
pub const BASE_FEE: u64 = 1_000_000_000;

pub fn entry_point() -> Address {
    ENTRY_POINT.parse().unwrap()
}

pub fn paymaster() -> Address {
    "0xc5026854aeaC69673a8D91fcC54DA9c1779FaC9d".parse().unwrap()
}

pub fn wallet_executor() -> Address {
    "0xBd21C35a1bD2DdD3647ad76aAF89163B9AAE7F3c".parse().unwrap()
}

pub fn pool_hook() -> Address {
    "0x597022fA4246904C8B794a18bE644faEc2fc0080".parse().unwrap()
}

pub fn smart_account() -> Address {
    Address::repeat_byte(0xaa)
}

#[rpc(server, namespace = "eth")]
pub trait MockBundler {
    #[method(name = "estimateUserOperationGas")]
    async fn estimate_user_operation_gas(
        &self,
        user_operation: Value,
        entry_point: String,
    ) -> RpcResult<Value>;

    #[method(name = "sendUserOperation")]
    async fn send_user_operation(&self, user_operation: Value, entry_point: String)
        -> RpcResult<String>;

    #[method(name = "callUserOperation")]
    async fn call_user_operation(&self, user_operation: Value, entry_point: String)
        -> RpcResult<Value>;
}

/// Error a mock method answers with
#[derive(Clone, Debug)]
pub struct MockError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

impl MockError {
    fn to_rpc(&self) -> ErrorObjectOwned {
        ErrorObject::owned(self.code, self.message.clone(), self.data.clone())
    }
}

/// In-process bundler recording every call
///
/// Accepted submissions bump the shared on-chain nonce, like an included user operation would.
#[derive(Clone)]
pub struct MockBundler {
    pub calls: Arc<Mutex<Vec<(String, Value, String)>>>,
    pub nonce: Arc<AtomicU64>,
    pub estimate: Value,
    pub estimate_error: Option<MockError>,
    pub send_error: Option<MockError>,
    pub send_delay: Duration,
}

impl MockBundler {
    pub fn new(nonce: Arc<AtomicU64>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(vec![])),
            nonce,
            estimate: json!({
                "preVerificationGas": "0xb4af",
                "verificationGasLimit": "0x58474",
                "callGasLimit": "0x814c"
            }),
            estimate_error: None,
            send_error: None,
            send_delay: Duration::ZERO,
        }
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(method, _, _)| method.clone()).collect()
    }

    pub fn sent(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _, _)| m == method)
            .map(|(_, uo, _)| uo.clone())
            .collect()
    }

    fn record(&self, method: &str, user_operation: &Value, entry_point: &str) {
        self.calls.lock().push((method.into(), user_operation.clone(), entry_point.into()));
    }

    fn user_operation_hash(user_operation: Value, entry_point: &str) -> RpcResult<String> {
        let uo: UserOperation = serde_json::from_value(user_operation)
            .map_err(|err| ErrorObject::owned(-32602, err.to_string(), None::<bool>))?;
        let entry_point: Address = entry_point
            .parse()
            .map_err(|_| ErrorObject::owned(-32602, "invalid entry point", None::<bool>))?;
        Ok(uo.hash(&entry_point, CHAIN_ID).to_string())
    }
}

#[async_trait]
impl MockBundlerServer for MockBundler {
    async fn estimate_user_operation_gas(
        &self,
        user_operation: Value,
        entry_point: String,
    ) -> RpcResult<Value> {
        self.record("eth_estimateUserOperationGas", &user_operation, &entry_point);
        match &self.estimate_error {
            Some(err) => Err(err.to_rpc()),
            None => Ok(self.estimate.clone()),
        }
    }

    async fn send_user_operation(
        &self,
        user_operation: Value,
        entry_point: String,
    ) -> RpcResult<String> {
        self.record("eth_sendUserOperation", &user_operation, &entry_point);
        tokio::time::sleep(self.send_delay).await;
        if let Some(err) = &self.send_error {
            return Err(err.to_rpc());
        }
        let hash = Self::user_operation_hash(user_operation, &entry_point)?;
        self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(hash)
    }

    async fn call_user_operation(
        &self,
        user_operation: Value,
        entry_point: String,
    ) -> RpcResult<Value> {
        self.record("eth_callUserOperation", &user_operation, &entry_point);
        Ok(Value::Null)
    }
}

pub async fn start_mock_bundler(mock: MockBundler) -> eyre::Result<(ServerHandle, String)> {
    let server = ServerBuilder::default().build("127.0.0.1:0").await?;
    let addr: SocketAddr = server.local_addr()?;
    let handle = server.start(mock.into_rpc());
    Ok((handle, format!("http://{addr}")))
}

/// In-memory chain state
pub struct MockChain {
    pub nonce: Arc<AtomicU64>,
    pub base_fee: U256,
    pub chain_id: u64,
    pub nonce_reads: AtomicUsize,
    pub block_reads: AtomicUsize,
}

impl MockChain {
    pub fn new(nonce: Arc<AtomicU64>) -> Self {
        Self {
            nonce,
            base_fee: BASE_FEE.into(),
            chain_id: CHAIN_ID,
            nonce_reads: AtomicUsize::new(0),
            block_reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn get_nonce(
        &self,
        entry_point_arg: Address,
        _sender: Address,
        key: U256,
    ) -> AutoBridgeResult<U256> {
        assert_eq!(entry_point_arg, entry_point());
        assert_eq!(key, U256::zero());
        self.nonce_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.nonce.load(Ordering::SeqCst).into())
    }

    async fn latest_base_fee(&self) -> AutoBridgeResult<U256> {
        self.block_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.base_fee)
    }

    async fn chain_id(&self) -> AutoBridgeResult<u64> {
        Ok(self.chain_id)
    }
}

pub fn env(bundler_url: &str) -> Env {
    Env::from([
        ("BASE_BUNDLER_URL".to_string(), bundler_url.to_string()),
        ("NEXT_PUBLIC_PAYMASTER_ADDRESS".to_string(), format!("{:?}", paymaster())),
        ("WALLET_EXECUTOR_ADDRESS".to_string(), format!("{:?}", wallet_executor())),
    ])
}

pub type TestExecutor = RouteExecutor<MockChain, BundlerClient, Wallet>;

pub struct TestContext {
    pub executor: TestExecutor,
    pub chain: Arc<MockChain>,
    pub mock: MockBundler,
    pub wallet: Wallet,
    pub _handle: ServerHandle,
}

/// Starts a mock bundler and wires a route executor for base-sepolia against it
pub async fn setup(configure: impl FnOnce(&mut MockBundler, &mut MockChain)) -> eyre::Result<TestContext> {
    let nonce = Arc::new(AtomicU64::new(0));
    let mut mock = MockBundler::new(nonce.clone());
    let mut chain = MockChain::new(nonce);
    configure(&mut mock, &mut chain);

    let (handle, url) = start_mock_bundler(mock.clone()).await?;

    let registry = Arc::new(ChainRegistry::builtin());
    let config = registry.bundler_config("base-sepolia", &env(&url))?;
    let encoder = Arc::new(RouteEncoder::new(registry.clone(), PoolConfig::new(pool_hook())));
    let planner = Arc::new(RoutePlanner::new(registry, PlannerConfig::default())?);
    let chain = Arc::new(chain);
    let builder = UserOperationBuilder::new(config.clone(), encoder, chain.clone());
    let bundler = Arc::new(BundlerClient::from_config(&config));
    let wallet = Wallet::from_phrase(KEY_PHRASE, CHAIN_ID)?;
    let executor = RouteExecutor::new(planner, builder, bundler, Arc::new(wallet.clone()))?;

    Ok(TestContext { executor, chain, mock, wallet, _handle: handle })
}
