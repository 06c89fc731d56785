use async_trait::async_trait;
use autobridge_contracts::EntryPoint;
use autobridge_primitives::{constants::bundler::REQUEST_TIMEOUT, AutoBridgeError, AutoBridgeResult};
use ethers::{
    providers::Middleware,
    types::{Address, BlockNumber, U256},
};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::trace;

/// Reads the on-chain state a user operation build depends on
///
/// Every call reads fresh values, nothing is cached between builds.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Next nonce of `sender` in the `key` sequence of the entry point
    async fn get_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U256,
    ) -> AutoBridgeResult<U256>;

    /// Base fee of the latest block (zero on chains without EIP-1559)
    async fn latest_base_fee(&self) -> AutoBridgeResult<U256>;

    async fn chain_id(&self) -> AutoBridgeResult<u64>;
}

/// Runs a network call under a timeout
pub(crate) async fn with_timeout<T, F>(
    operation: &str,
    timeout: Duration,
    fut: F,
) -> AutoBridgeResult<T>
where
    F: Future<Output = AutoBridgeResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| AutoBridgeError::Timeout { operation: operation.to_string(), timeout })?
}

/// [ChainReader](ChainReader) backed by an Ethereum execution client
#[derive(Clone, Debug)]
pub struct EthereumClient<M: Middleware + 'static> {
    eth_client: Arc<M>,
    timeout: Duration,
}

impl<M> EthereumClient<M>
where
    M: Middleware + 'static,
{
    /// Create an Ethereum client
    ///
    /// # Arguments
    /// * `eth_client` - Connection to the Ethereum execution client
    ///
    /// # Returns
    /// * `EthereumClient` - A client whose calls time out after the default request timeout
    pub fn new(eth_client: Arc<M>) -> Self {
        Self { eth_client, timeout: Duration::from_secs(REQUEST_TIMEOUT) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn eth_client(&self) -> Arc<M> {
        self.eth_client.clone()
    }
}

#[async_trait]
impl<M> ChainReader for EthereumClient<M>
where
    M: Middleware + 'static,
{
    async fn get_nonce(
        &self,
        entry_point: Address,
        sender: Address,
        key: U256,
    ) -> AutoBridgeResult<U256> {
        let entry_point = EntryPoint::new(self.eth_client.clone(), entry_point);
        let nonce = with_timeout("getNonce", self.timeout, async {
            entry_point.get_nonce(&sender, key).await.map_err(AutoBridgeError::from)
        })
        .await?;

        trace!("Nonce of {sender:?} (key {key}): {nonce}");

        Ok(nonce)
    }

    async fn latest_base_fee(&self) -> AutoBridgeResult<U256> {
        let block = with_timeout("eth_getBlockByNumber", self.timeout, async {
            self.eth_client
                .get_block(BlockNumber::Latest)
                .await
                .map_err(|err| AutoBridgeError::transport(format!("Failed to fetch latest block: {err}")))
        })
        .await?
        .ok_or_else(|| AutoBridgeError::transport("Latest block not found"))?;

        Ok(block.base_fee_per_gas.unwrap_or_default())
    }

    async fn chain_id(&self) -> AutoBridgeResult<u64> {
        let chain_id = with_timeout("eth_chainId", self.timeout, async {
            self.eth_client
                .get_chainid()
                .await
                .map_err(|err| AutoBridgeError::transport(format!("Failed to fetch chain id: {err}")))
        })
        .await?;

        u64::try_from(chain_id).map_err(|_| {
            AutoBridgeError::transport(format!("Chain id {chain_id} does not fit into u64"))
        })
    }
}
