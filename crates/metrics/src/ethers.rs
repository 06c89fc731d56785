use async_trait::async_trait;
use ethers::{
    providers::{Middleware, MiddlewareError},
    types::{transaction::eip2718::TypedTransaction, Block, BlockId, Bytes, H256, U256},
};
use metrics::{counter, describe_counter};
use std::fmt::Debug;
use thiserror::Error;

const ETH_CLIENT_REQUEST: &str = "autobridge_eth_client_request";
const ETH_CLIENT_REQUEST_SUCCESS: &str = "autobridge_eth_client_request_success";
const ETH_CLIENT_REQUEST_FAILED: &str = "autobridge_eth_client_request_failed";

/// Counts the execution client requests a route build issues (nonce, latest block, chain id)
#[derive(Debug, Clone)]
pub struct MetricsMiddleware<M> {
    inner: M,
}

impl<M> MetricsMiddleware<M>
where
    M: Middleware,
{
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[derive(Error, Debug)]
pub enum MetricError<M: Middleware> {
    /// Thrown when the internal middleware errors
    #[error("{0}")]
    MiddlewareError(M::Error),
}

impl<M: Middleware> MiddlewareError for MetricError<M> {
    type Inner = M::Error;

    fn from_err(src: M::Error) -> Self {
        MetricError::MiddlewareError(src)
    }

    fn as_inner(&self) -> Option<&Self::Inner> {
        match self {
            MetricError::MiddlewareError(e) => Some(e),
        }
    }
}

#[async_trait]
impl<M> Middleware for MetricsMiddleware<M>
where
    M: Middleware,
{
    type Error = MetricError<M>;

    type Provider = M::Provider;

    type Inner = M;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn get_block<T: Into<BlockId> + Send + Sync>(
        &self,
        block_hash_or_number: T,
    ) -> Result<Option<Block<H256>>, Self::Error> {
        counter!(ETH_CLIENT_REQUEST, "method" => "eth_getBlockByNumber").increment(1);
        result_counter(self.inner().get_block(block_hash_or_number).await, "eth_getBlockByNumber")
    }

    /// Entry point `getNonce` reads go through here
    async fn call(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> Result<Bytes, Self::Error> {
        counter!(ETH_CLIENT_REQUEST, "method" => "eth_call").increment(1);
        result_counter(self.inner().call(tx, block).await, "eth_call")
    }

    async fn get_chainid(&self) -> Result<U256, Self::Error> {
        counter!(ETH_CLIENT_REQUEST, "method" => "eth_chainId").increment(1);
        result_counter(self.inner().get_chainid().await, "eth_chainId")
    }
}

fn result_counter<M, T, E>(result: Result<T, E>, method: &'static str) -> Result<T, MetricError<M>>
where
    M: Middleware<Error = E>,
    E: Send + Sync + Debug,
{
    match result {
        Ok(res) => {
            counter!(ETH_CLIENT_REQUEST_SUCCESS, "method" => method).increment(1);
            Ok(res)
        }
        Err(e) => {
            counter!(ETH_CLIENT_REQUEST_FAILED, "method" => method).increment(1);
            Err(MiddlewareError::from_err(e))
        }
    }
}

pub fn describe_eth_client_metrics() {
    describe_counter!(ETH_CLIENT_REQUEST, "The number of execution client requests so far");
    describe_counter!(
        ETH_CLIENT_REQUEST_SUCCESS,
        "The number of successful execution client requests so far"
    );
    describe_counter!(
        ETH_CLIENT_REQUEST_FAILED,
        "The number of failed execution client requests so far"
    );
}
